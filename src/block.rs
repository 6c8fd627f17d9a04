// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The ORAM block.

use crate::{BlockId, DUMMY_BLOCK_ID};
use subtle::{Choice, ConstantTimeEq};

#[derive(Clone, PartialEq, Eq)]
/// A block combines a payload with its `id`. Blocks are copied between structures; no structure
/// owns a block exclusively.
pub struct Block {
    id: BlockId,
    payload: Vec<u8>,
    is_dummy: bool,
}

impl Block {
    /// Returns a real block with the given `id` and `payload`.
    /// A negative `id` is reserved for dummies and yields a dummy block.
    pub fn new(id: BlockId, payload: impl Into<Vec<u8>>) -> Self {
        if id < 0 {
            return Self::dummy();
        }
        Self {
            id,
            payload: payload.into(),
            is_dummy: false,
        }
    }

    /// Returns a dummy block.
    pub fn dummy() -> Self {
        Self {
            id: DUMMY_BLOCK_ID,
            payload: Vec::new(),
            is_dummy: true,
        }
    }

    /// The block's id, `-1` for dummies.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The block's payload. Empty for dummies.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether the block is a dummy.
    pub fn is_dummy(&self) -> bool {
        self.is_dummy
    }

    /// Returns `1` iff this is a real block with identifier `id`, in time independent of either id.
    pub fn ct_has_id(&self, id: BlockId) -> Choice {
        let is_real = Choice::from(u8::from(!self.is_dummy));
        self.id.ct_eq(&id) & is_real
    }

    /// Whether this is a real block with identifier `id`.
    pub fn has_id(&self, id: BlockId) -> bool {
        self.ct_has_id(id).into()
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::dummy()
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dummy {
            write!(f, "Block::Dummy")
        } else {
            f.debug_struct("Block")
                .field("id", &self.id)
                .field("payload", &String::from_utf8_lossy(&self.payload))
                .finish()
        }
    }
}
