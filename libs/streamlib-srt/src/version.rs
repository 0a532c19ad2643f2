// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! SRT protocol version this surface targets.

pub const SRT_VERSION_MAJOR: u32 = 1;
pub const SRT_VERSION_MINOR: u32 = 3;
pub const SRT_VERSION_PATCH: u32 = 0;

pub const SRT_VERSION_STRING: &str = "1.3.0";

/// Packed form, as exchanged in the handshake.
pub const SRT_VERSION_VALUE: u32 =
    make_version(SRT_VERSION_MAJOR, SRT_VERSION_MINOR, SRT_VERSION_PATCH);

/// Pack a version as `0x00MMmmpp`.
pub const fn make_version(major: u32, minor: u32, patch: u32) -> u32 {
    patch + minor * 0x100 + major * 0x10000
}
