// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Byte range of a construct inside one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub file: usize,
    pub start: u32,
    pub end: u32,
}

impl Loc {
    pub fn new(file: usize, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.file, self.start, self.end)
    }
}
