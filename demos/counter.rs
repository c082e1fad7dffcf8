//! Minimal counter on the in-memory host.
//!
//! Run with `cargo run --example counter`. Clicks are simulated through
//! `MemoryHost::dispatch`; each engine tick between clicks plays the role of
//! the host event loop granting a slice.

use cinder::{Child, Element, Engine, Handler, MemoryHost, Props, Scope, Value, build};

fn counter(scope: &mut Scope, props: &Props) -> Element {
    let step = props.get("step").and_then(Value::as_int).unwrap_or(1);
    let (count, set_count) = scope.state(0i64);
    let on_click = Handler::new(move |_| set_count.update(move |c| c + step));

    build(
        "div",
        Props::new(),
        [
            Child::from(build("button", Props::new().on("click", on_click), ["+"])),
            Child::from(build("span", Props::new(), [Child::from(count)])),
        ],
    )
}

fn main() {
    let mut engine = Engine::new(MemoryHost::new());
    let root = engine.host().root();

    engine.render(
        Element::component(counter, Props::new().set("step", 2)),
        root,
    );
    engine.run_until_idle();

    let div = engine.host().children_of(root)[0];
    let button = engine.host().children_of(div)[0];

    for _ in 0..5 {
        engine.host().dispatch(button, "click");
        engine.run_until_idle();
        println!("count: {}", engine.host().text_content(div).trim_start_matches('+'));
    }
}
