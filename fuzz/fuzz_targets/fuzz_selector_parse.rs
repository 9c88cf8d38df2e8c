#![no_main]

use libfuzzer_sys::fuzz_target;
use proxyland_dom::{Document, SelectorList};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 512 {
        return;
    }

    let parsed = SelectorList::parse(input);
    let doc = Document::from_body_markup(
        r#"<div id="a" class="x y"><p data-k="v">t</p><ul><li></li><li class="x"></li></ul></div>"#,
    );
    if let (Ok(list), Ok(doc)) = (parsed, doc) {
        assert!(!list.is_empty());
        let all = doc.query_selector_all(input).expect("parsed once, parses again");
        for element in &all {
            assert!(list.matches(element));
        }
    }
});
