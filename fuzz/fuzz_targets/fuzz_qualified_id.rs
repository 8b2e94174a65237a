// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use archgraph::identity::{parse_qualified_id, qualified_id};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Some(parts) = parse_qualified_id(data) {
        // Whatever parses must re-encode to something that parses the same way
        let again = qualified_id(parts.kind, &parts.system, &parts.container, &parts.component);
        assert_eq!(parse_qualified_id(&again), Some(parts));
    }
});
