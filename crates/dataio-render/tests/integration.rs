//! End-to-end render scenarios: size oracles for each format, parse
//! counterparts, entity-escaped XML, SOAP documents and compression.

mod common;

use common::{bare_renderer, full_renderer, nested_object, simple_xml_renderer, small_mapping};
use dataio_codec::error::ERR_FEATURE_UNAVAILABLE;
use dataio_codec::strings::escape_html;
use dataio_codec::CompressionKind;
use dataio_render::{BufferedTerminal, Format, Value, XmlDocument};

#[test]
fn test_object_to_mapping() {
    let graph = full_renderer().normalizer().to_graph(&nested_object());
    let a = graph.get("a").unwrap();
    assert!(a.as_mapping().is_some());
    assert!(a.get("nextLevel").unwrap().as_mapping().is_some());
    assert!(a
        .get("nextLevel")
        .and_then(|n| n.get("nextLevel"))
        .and_then(Value::as_mapping)
        .is_some());
}

#[test]
fn test_mapping_to_object() {
    let obj = full_renderer().normalizer().to_object(&small_mapping());
    assert!(obj.get("a").is_some());
    let b = obj.get("b").unwrap();
    assert!(b.as_object().is_some());
    assert_eq!(b.get("c"), Some(&Value::from("d")));
}

#[test]
fn test_json_size_oracle() {
    assert_eq!(full_renderer().render_json(&nested_object()).unwrap().len(), 170);
}

#[test]
fn test_serialized_size_oracle() {
    let out = full_renderer().render_serialized(&nested_object());
    assert_eq!(out.len(), 153);
    assert_eq!(
        out,
        br#"O:8:"stdClass":1:{s:1:"a";O:8:"stdClass":1:{s:9:"nextLevel";a:2:{s:10:"arrayLevel";s:6:"part 1";s:9:"nextLevel";a:1:{s:14:"recursiveLevel";s:3:"yes";}}}}"#
    );
}

#[test]
fn test_serialized_mapping_snapshot() {
    assert_eq!(
        full_renderer().render_serialized(&small_mapping()),
        br#"a:2:{s:1:"a";s:1:"b";s:1:"b";a:1:{s:1:"c";s:1:"d";}}"#
    );
}

#[test]
fn test_xml_renders_both_backends() {
    let simple = simple_xml_renderer().render_xml(&nested_object()).unwrap();
    assert!(simple.len() >= 100);
    let library = full_renderer().render_xml(&nested_object()).unwrap();
    assert!(library.len() >= 100);
    assert!(library.contains("<recursiveLevel>yes</recursiveLevel>"));
}

#[test]
fn test_json_string_is_rerendered() {
    let text = serde_json::to_string(&small_mapping()).unwrap();
    let out = full_renderer().render_json_str(&text).unwrap();
    assert!(out.len() > 50);
}

#[test]
fn test_parse_json() {
    let r = full_renderer();
    let text = serde_json::to_string(&small_mapping()).unwrap();
    assert!(r.parse_json(&text).unwrap().get("a").is_some());
    assert!(r.parse_json("").is_none());
}

#[test]
fn test_parse_simple_xml() {
    let r = simple_xml_renderer();
    let xml = r.render_xml(&nested_object()).unwrap();
    let doc = r.parse_xml(&xml, true).unwrap().into_value();
    assert!(doc.get("a").is_some());

    match r.parse_xml(&xml, false).unwrap() {
        XmlDocument::Tree(root) => assert!(root.child("a").is_some()),
        other => panic!("expected tree, got {:?}", other),
    }
}

#[test]
fn test_parse_entity_escaped_xml_once() {
    let r = simple_xml_renderer();
    let escaped = escape_html(&r.render_xml(&nested_object()).unwrap());
    assert!(escaped.starts_with("&lt;"));
    let doc = r.parse_xml(&escaped, true).unwrap().into_value();
    assert!(doc.get("a").is_some());
}

#[test]
fn test_parse_entity_escaped_xml_twice_fails() {
    let r = simple_xml_renderer();
    let twice = escape_html(&escape_html(&r.render_xml(&nested_object()).unwrap()));
    assert!(r.parse_xml(&twice, true).is_none());
    let thrice = escape_html(&twice);
    assert!(r.parse_xml(&thrice, true).is_none());
}

#[test]
fn test_parse_with_library_unserializer() {
    let mut r = full_renderer();
    r.set_use_unserializer(true);
    let xml = r.render_xml(&nested_object()).unwrap();
    let doc = r.parse_xml(&xml, true).unwrap().into_value();
    assert_eq!(
        doc.get("a")
            .and_then(|a| a.get("nextLevel"))
            .and_then(|n| n.get("arrayLevel")),
        Some(&Value::from("part 1"))
    );

    let objects = r.parse_xml(&xml, false).unwrap().into_value();
    assert!(objects.get("a").unwrap().as_object().is_some());
}

#[test]
fn test_soap_document_parses_empty() {
    let soap = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<SOAP-ENV:Envelope xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\">",
        "<SOAP-ENV:Body><getMethodName/></SOAP-ENV:Body></SOAP-ENV:Envelope>"
    );
    let r = simple_xml_renderer();
    let doc = r.parse_xml(soap, true).unwrap().into_value();
    assert!(doc.is_empty());
    assert!(doc.as_mapping().is_some());
}

#[test]
fn test_soap_render() {
    let r = simple_xml_renderer();
    let mut options = r.options();
    options.xml.root_name = "getMethodName".to_string();
    options.xml.soap = Some(Default::default());
    let body = Value::mapping([("Body", Value::mapping([("getMethodName", Value::Sequence(vec![]))]))]);
    let out = r.render(&body, Format::Xml, &options).unwrap();
    let text = out.text().unwrap();
    assert!(text.contains("<SOAP-ENV:Body><getMethodName>"));
    assert!(text.ends_with("</SOAP-ENV:Body></SOAP-ENV:Envelope>\n"));
}

#[test]
fn test_yaml_round_trip() {
    let r = full_renderer();
    let yaml = r.render_yaml(&small_mapping()).unwrap();
    let as_mapping = r.parse_yaml(&yaml, true).unwrap();
    assert!(as_mapping.as_mapping().is_some());
    assert!(as_mapping.get("a").is_some());
    let as_object = r.parse_yaml(&yaml, false).unwrap();
    assert!(as_object.as_object().is_some());
    assert!(as_object.get("a").is_some());
}

#[test]
fn test_bad_yaml_is_none() {
    let r = full_renderer();
    assert!(r.parse_yaml("", true).is_none());
    assert!(r.parse_yaml("a: [unclosed", true).is_none());
}

#[test]
fn test_yaml_unavailable_is_404() {
    let err = bare_renderer().render_yaml(&small_mapping()).unwrap_err();
    assert_eq!(err.code(), ERR_FEATURE_UNAVAILABLE);
}

#[test]
fn test_serial_parse() {
    let r = full_renderer();
    let parsed = r
        .parse_serialized(&r.render_serialized(&small_mapping()))
        .unwrap();
    assert!(parsed.get("a").is_some());
    assert!(r.parse_serialized(b"fail_this").is_none());
}

#[test]
fn test_gzip_json_shrinks_and_decompresses() {
    let r = full_renderer();
    let plain = r.render_json(&nested_object()).unwrap();
    let options = r.options().compressed(CompressionKind::Gzip);
    let rendered = r.render(&nested_object(), Format::Json, &options).unwrap();
    assert!(rendered.body.len() < plain.len());
    let back = r
        .compressor()
        .decompress(&rendered.body, CompressionKind::Gzip)
        .unwrap();
    assert_eq!(back, plain.as_bytes());
}

#[test]
fn test_bzip2_serialized() {
    let r = full_renderer();
    let options = r.options().compressed(CompressionKind::Bzip2);
    let rendered = r
        .render(&nested_object(), Format::Serialized, &options)
        .unwrap();
    assert_eq!(rendered.tag(), "bz2");
    let back = r
        .compressor()
        .decompress(&rendered.body, CompressionKind::Bzip2)
        .unwrap();
    assert_eq!(back.len(), 153);
}

#[test]
fn test_render_to_terminal() {
    let r = full_renderer();
    let mut term = BufferedTerminal::default();
    r.render_to(&mut term, &small_mapping(), Format::Json, &r.options())
        .unwrap();
    assert_eq!(
        term.header_value("content-type"),
        Some("application/json; charset=utf-8")
    );
    assert!(term.terminated);
    assert!(r.render_to(&mut term, &small_mapping(), Format::Json, &r.options()).is_err());
}

#[test]
fn test_deeply_nested_input_parses_to_none() {
    let depth = 200_000;
    let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    let serial = format!("{}N;{}", "a:1:{i:0;".repeat(depth), "}".repeat(depth));

    let r = simple_xml_renderer();
    assert!(r.parse_xml(&xml, true).is_none());
    assert!(r.parse_serialized(serial.as_bytes()).is_none());

    let mut library = full_renderer();
    library.set_use_unserializer(true);
    assert!(library.parse_xml(&xml, true).is_none());
}

#[test]
fn test_large_flat_mapping_round_trips() {
    let r = full_renderer();
    let graph = Value::mapping((0..50_000).map(|i| (format!("k{}", i), Value::Int(i))));
    let json = r.render_json(&graph).unwrap();
    let parsed = r.parse_json_graph(&json).unwrap();
    assert_eq!(parsed.as_mapping().map(|m| m.len()), Some(50_000));
    assert_eq!(parsed, graph);
    let serial = r.render_serialized(&graph);
    assert_eq!(r.parse_serialized(&serial), Some(graph));
}
