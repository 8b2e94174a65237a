// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use archgraph::drift::detect_drift;
use archgraph::manifest::parse_manifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(tree) = parse_manifest(data) {
        let _ = detect_drift(&tree, None, "d2");
    }
});
