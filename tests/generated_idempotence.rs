//! Property-based tests for the text repairs
//!
//! Inputs are stitched together from the fragments converters actually emit:
//! dash runs, continuation markers, placeholders, image macros, captions and
//! both LF and CRLF line endings. Running a repair twice must give the same
//! result as running it once.

use dmforge::document::{cleanup, icn_migration::migrate_inline_codes_within};
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "-",
    "--",
    "---",
    "+",
    " +",
    "%%PLUS%%",
    " ",
    "  ",
    "\t",
    "\r",
    "\n",
    "\r\n",
    "text",
    "image::a.png[]",
    "image::b.png[] x",
    "image::c.png",
    "ICN-AB-12",
    "ICN-CD-34",
    ".Cap",
    "[icn=ICN-EF-56]",
];

/// Generate documents from converter fragments
fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..48)
        .prop_map(|fragments| fragments.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn cleanup_is_idempotent(text in document_strategy()) {
        let once = cleanup(&text);
        prop_assert_eq!(cleanup(&once), once, "input: {:?}", text);
    }

    #[test]
    fn cleanup_keeps_crlf_endings(text in document_strategy()) {
        let crlf = text.replace("\r\n", "\n").replace('\r', "").replace('\n', "\r\n");
        let cleaned = cleanup(&crlf);
        prop_assert!(
            !cleaned.replace("\r\n", "").contains('\n'),
            "bare LF in {:?} from {:?}",
            cleaned,
            crlf
        );
    }

    #[test]
    fn migration_is_idempotent(text in document_strategy(), window in 1_usize..8) {
        let once = migrate_inline_codes_within(&text, window);
        let twice = migrate_inline_codes_within(&once.text, window);
        prop_assert_eq!(twice.change_count, 0, "input: {:?}", text);
        prop_assert_eq!(twice.text, once.text);
    }

    #[test]
    fn migration_without_changes_returns_input(text in document_strategy()) {
        let migration = migrate_inline_codes_within(&text, 5);
        if migration.change_count == 0 {
            prop_assert_eq!(migration.text, text);
        }
    }
}
