// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use archgraph::diagram::{ArrowParser, DiagramParser, ParseContext};
use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;

fuzz_target!(|data: &str| {
    let ctx = ParseContext {
        component_id: "component:fuzz/app/target".into(),
        path: PathBuf::from("fuzz.d2"),
    };
    let _ = ArrowParser.parse_relationships(&ctx, data);
});
