use super::Headers;
use super::headers::names;

#[test]
fn test_new_headers_is_empty() {
    let headers = Headers::new();
    assert!(headers.is_empty());
    assert_eq!(headers.len(), 0);
}

#[test]
fn test_insert_and_get_case_insensitive() {
    let mut headers = Headers::new();
    headers.insert("Content-Type", "application/sdp");

    assert_eq!(headers.get("Content-Type"), Some("application/sdp"));
    assert_eq!(headers.get("content-type"), Some("application/sdp"));
    assert_eq!(headers.get("CONTENT-TYPE"), Some("application/sdp"));
    assert!(headers.contains("content-TYPE"));
}

#[test]
fn test_insertion_order_preserved() {
    let mut headers = Headers::new();
    headers.insert("Zeta", "1");
    headers.insert("Alpha", "2");
    headers.insert("Mid", "3");

    let names: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
}

#[test]
fn test_overwrite_keeps_position() {
    let mut headers = Headers::new();
    headers.insert("First", "a");
    headers.insert("Test-Header", "Value1");
    headers.insert("Last", "z");
    headers.insert("test-header", "Value2");

    assert_eq!(headers.len(), 3);
    let entries: Vec<(&str, &str)> = headers.iter().collect();
    assert_eq!(
        entries,
        vec![("First", "a"), ("Test-Header", "Value2"), ("Last", "z")]
    );
}

#[test]
fn test_remove() {
    let mut headers = Headers::new();
    headers.insert("Apple-Challenge", "abc");
    headers.insert("Client-Instance", "0123");

    assert_eq!(headers.remove("apple-challenge"), Some("abc".to_string()));
    assert_eq!(headers.remove("Apple-Challenge"), None);
    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("Client-Instance"), Some("0123"));
}

#[test]
fn test_typed_accessors() {
    let headers: Headers = [
        (names::CSEQ, "7"),
        (names::CONTENT_LENGTH, "42"),
        (names::SESSION, "DEADBEEF"),
        (names::CONTENT_TYPE, "text/parameters"),
    ]
    .into_iter()
    .collect();

    assert_eq!(headers.cseq(), Some(7));
    assert_eq!(headers.content_length(), Some(42));
    assert_eq!(headers.session(), Some("DEADBEEF"));
    assert_eq!(headers.content_type(), Some("text/parameters"));
}

#[test]
fn test_invalid_numeric_values() {
    let mut headers = Headers::new();
    headers.insert(names::CSEQ, "abc");
    headers.insert(names::CONTENT_LENGTH, "-1");

    assert_eq!(headers.cseq(), None);
    assert_eq!(headers.content_length(), None);
}

#[test]
fn test_extend_from() {
    let mut base: Headers = [("A", "1"), ("B", "2")].into_iter().collect();
    let extra: Headers = [("b", "3"), ("C", "4")].into_iter().collect();

    base.extend_from(&extra);

    let entries: Vec<(&str, &str)> = base.iter().collect();
    assert_eq!(entries, vec![("A", "1"), ("B", "3"), ("C", "4")]);
}
