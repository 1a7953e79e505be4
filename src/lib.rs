#![cfg_attr(
    any(
        feature = "portable-simd",
        not(any(
            target_arch = "x86_64",
            all(target_arch = "x86", target_feature = "sse2"),
            target_arch = "aarch64"
        ))
    ),
    feature(portable_simd)
)]
#![feature(allocator_api)]

pub mod numerics;
pub mod reached;
pub mod schedule;
pub mod statistics;
pub mod workload;
