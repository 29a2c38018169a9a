//! Common test utilities for the render integration tests.

#![allow(dead_code)]

use dataio_codec::Capabilities;
use dataio_render::{RenderConfig, Renderer, Value, XmlBackend};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// Two-level object graph: `{a: {nextLevel: {arrayLevel, nextLevel: {recursiveLevel}}}}`
/// with the outer two levels as generic objects.
pub fn nested_object() -> Value {
    Value::object([(
        "a",
        Value::object([(
            "nextLevel",
            Value::mapping([
                ("arrayLevel", Value::from("part 1")),
                (
                    "nextLevel",
                    Value::mapping([("recursiveLevel", Value::from("yes"))]),
                ),
            ]),
        )]),
    )])
}

/// `{a: "b", b: {c: "d"}}`
pub fn small_mapping() -> Value {
    Value::mapping([
        ("a", Value::from("b")),
        ("b", Value::mapping([("c", Value::from("d"))])),
    ])
}

/// Renderer with every compiled-in feature advertised.
pub fn full_renderer() -> Renderer {
    init_tracing();
    Renderer::probe()
}

/// Renderer using the simple XML builder and parser.
pub fn simple_xml_renderer() -> Renderer {
    let mut r = full_renderer();
    r.set_xml_backend(XmlBackend::Simple);
    r
}

/// Renderer with no optional capability at all.
pub fn bare_renderer() -> Renderer {
    init_tracing();
    Renderer::new(Capabilities::none(), RenderConfig::default())
}
