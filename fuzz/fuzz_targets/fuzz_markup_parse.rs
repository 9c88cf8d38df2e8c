#![no_main]

use libfuzzer_sys::fuzz_target;
use proxyland_dom::Element;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 2048 {
        return;
    }

    let host = Element::new("div");
    if host.set_inner_html(input).is_ok() {
        // Serialized output must parse back to the same markup.
        let first = host.inner_html();
        let again = Element::new("div");
        again
            .set_inner_html(&first)
            .expect("serialized markup parses");
        assert_eq!(again.inner_html(), first);
        let _ = host.text_content();
    }
});
