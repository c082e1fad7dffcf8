//! Todo list on the in-memory host.
//!
//! Exercises list reconciliation: adding appends a placement, removing the
//! first entry shifts every trailing item in place (positional diffing has
//! no move detection). Run with `cargo run --example todo`.

use cinder::{Child, Element, Engine, Handler, MemoryHost, Props, Scope, build};

fn todo_app(scope: &mut Scope, _props: &Props) -> Element {
    let (items, set_items) = scope.state(Vec::<String>::new());
    let (next_id, set_next_id) = scope.state(1i64);

    let add_items = set_items.clone();
    let on_add = Handler::new(move |_| {
        let id = next_id;
        add_items.update(move |items| {
            let mut items = items.clone();
            items.push(format!("task {id}"));
            items
        });
        set_next_id.update(|id| id + 1);
    });
    let on_pop = Handler::new(move |_| {
        set_items.update(|items| items.iter().skip(1).cloned().collect());
    });

    let rows: Vec<Element> = items
        .iter()
        .map(|item| build("li", Props::new(), [item.as_str()]))
        .collect();

    build(
        "div",
        Props::new(),
        [
            Child::from(build("button", Props::new().set("id", "add").on("click", on_add), ["add"])),
            Child::from(build("button", Props::new().set("id", "pop").on("click", on_pop), ["pop"])),
            Child::from(build("ul", Props::new(), [Child::from(rows)])),
        ],
    )
}

fn main() {
    let mut engine = Engine::new(MemoryHost::new());
    let root = engine.host().root();

    engine.render(Element::component(todo_app, Props::new()), root);
    engine.run_until_idle();

    let div = engine.host().children_of(root)[0];
    let add = engine.host().children_of(div)[0];
    let pop = engine.host().children_of(div)[1];
    let list = engine.host().children_of(div)[2];

    for _ in 0..3 {
        engine.host().dispatch(add, "click");
        engine.run_until_idle();
    }
    println!("after 3 adds: {:?}", engine.host().text_content(list));

    engine.host().dispatch(pop, "click");
    engine.run_until_idle();
    println!("after 1 pop:  {:?}", engine.host().text_content(list));
}
