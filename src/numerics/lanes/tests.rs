//! Backend-independent checks: whichever backend is compiled in must agree with
//! a plain lane-by-lane computation.

use proptest::prelude::*;

use super::*;

fn scalar_zip<T: LaneValue>(a: [T; LANES], b: [T; LANES], f: impl Fn(T, T) -> T) -> [T; LANES] {
    std::array::from_fn(|i| f(a[i], b[i]))
}

fn mask_of<T: LaneValue>(a: [T; LANES], b: [T; LANES], f: impl Fn(T, T) -> bool) -> [T; LANES] {
    std::array::from_fn(|i| if f(a[i], b[i]) { T::MAX } else { T::ZERO })
}

fn canonical_mask<T: LaneValue>(select: [bool; LANES]) -> [T; LANES] {
    std::array::from_fn(|i| if select[i] { T::MAX } else { T::ZERO })
}

macro_rules! backend_properties {
    ($module:ident, $vector:ty, $lane:ty) => {
        mod $module {
            use super::*;

            type V = $vector;

            fn lanes() -> impl Strategy<Value = [$lane; LANES]> {
                prop::array::uniform16(any::<$lane>())
            }

            proptest! {
                #[test]
                fn test_load_store_roundtrip(a in lanes()) {
                    let v = V::load(&a);
                    let mut out = [0; LANES];
                    v.store(&mut out);
                    prop_assert_eq!(out, a);
                    prop_assert_eq!(v.as_array(), &a);
                }

                #[test]
                fn test_splat_sets_every_lane(x in any::<$lane>()) {
                    prop_assert_eq!(V::splat(x).to_array(), [x; LANES]);
                }

                #[test]
                fn test_wrapping_arithmetic(a in lanes(), b in lanes()) {
                    let (va, vb) = (V::load(&a), V::load(&b));
                    prop_assert_eq!((va + vb).to_array(), scalar_zip(a, b, <$lane>::wrapping_add));
                    prop_assert_eq!((va - vb).to_array(), scalar_zip(a, b, <$lane>::wrapping_sub));
                }

                #[test]
                fn test_bitwise_operations(a in lanes(), b in lanes()) {
                    let (va, vb) = (V::load(&a), V::load(&b));
                    prop_assert_eq!((va & vb).to_array(), scalar_zip(a, b, |x, y| x & y));
                    prop_assert_eq!((va | vb).to_array(), scalar_zip(a, b, |x, y| x | y));
                    prop_assert_eq!((va ^ vb).to_array(), scalar_zip(a, b, |x, y| x ^ y));
                }

                #[test]
                fn test_logical_shifts(a in lanes(), bits in 0u32..(2 * <$lane>::BITS)) {
                    let v = V::load(&a);
                    let expected_left = a.map(|x| x.checked_shl(bits).unwrap_or(0));
                    let expected_right = a.map(|x| x.checked_shr(bits).unwrap_or(0));
                    prop_assert_eq!((v << bits).to_array(), expected_left);
                    prop_assert_eq!((v >> bits).to_array(), expected_right);
                }

                #[test]
                fn test_equality_mask(a in lanes(), b in lanes(), same in prop::array::uniform16(any::<bool>())) {
                    // force some lanes equal, otherwise random inputs hardly ever match.
                    let b: [$lane; LANES] = std::array::from_fn(|i| if same[i] { a[i] } else { b[i] });
                    let eq = V::load(&a).lanes_eq(V::load(&b));
                    prop_assert_eq!(eq.to_array(), mask_of(a, b, |x, y| x == y));
                }

                #[test]
                fn test_max_in_place_reports_unchanged_lanes(a in lanes(), b in lanes()) {
                    let mut v = V::load(&a);
                    let unchanged = v.max_in_place(V::load(&b));
                    prop_assert_eq!(v.to_array(), scalar_zip(a, b, Ord::max));
                    prop_assert_eq!(unchanged.to_array(), mask_of(a, b, |x, y| x >= y));
                }

                #[test]
                fn test_min_in_place_reports_unchanged_lanes(a in lanes(), b in lanes()) {
                    let mut v = V::load(&a);
                    let unchanged = v.min_in_place(V::load(&b));
                    prop_assert_eq!(v.to_array(), scalar_zip(a, b, Ord::min));
                    prop_assert_eq!(unchanged.to_array(), mask_of(a, b, |x, y| x <= y));
                }

                #[test]
                fn test_blend_with_canonical_mask(a in lanes(), b in lanes(), keep in prop::array::uniform16(any::<bool>())) {
                    let mut v = V::load(&a);
                    v.blend(V::load(&b), V::load(&canonical_mask(keep)));
                    let expected: [$lane; LANES] = std::array::from_fn(|i| if keep[i] { a[i] } else { b[i] });
                    prop_assert_eq!(v.to_array(), expected);
                }

                #[test]
                fn test_blend_is_bitwise(a in lanes(), b in lanes(), m in lanes()) {
                    let mut v = V::load(&a);
                    v.blend(V::load(&b), V::load(&m));
                    let expected: [$lane; LANES] = std::array::from_fn(|i| (m[i] & a[i]) | (!m[i] & b[i]));
                    prop_assert_eq!(v.to_array(), expected);
                }

                #[test]
                fn test_lane_views_share_storage(a in lanes(), lane in 0usize..LANES, x in any::<$lane>()) {
                    let mut v = V::load(&a);
                    v[lane] = x;
                    let mut expected = a;
                    expected[lane] = x;
                    prop_assert_eq!(v.to_array(), expected);
                    prop_assert_eq!(v, V::load(&expected));
                    v.as_mut_array()[lane] = <$lane>::MAX;
                    prop_assert_eq!(v[lane], <$lane>::MAX);
                }
            }

            #[test]
            fn test_default_is_zero() {
                assert_eq!(V::default().to_array(), [0; LANES]);
            }

            #[test]
            fn test_fill_overwrites_all_lanes() {
                let mut v = V::load(&std::array::from_fn(|i| i as $lane));
                v.fill(9);
                assert_eq!(v, V::splat(9));
            }

            #[test]
            fn test_add_wraps_at_lane_width() {
                let v = V::splat(<$lane>::MAX) + V::splat(2);
                assert_eq!(v, V::splat(1));
                let w = V::splat(0) - V::splat(1);
                assert_eq!(w, V::splat(<$lane>::MAX));
            }

            #[test]
            fn test_shift_does_not_leak_across_lanes() {
                let mut a = [0 as $lane; LANES];
                a[0] = <$lane>::MAX;
                let v = V::load(&a) << 1;
                assert_eq!(v[0], <$lane>::MAX - 1);
                assert_eq!(v[1], 0);
                let w = V::load(&a) >> 1;
                assert_eq!(w[0], <$lane>::MAX >> 1);
                assert_eq!(w[1], 0);
            }

            #[test]
            fn test_equality_mask_sets_every_bit() {
                let mut b = [3 as $lane; LANES];
                b[4] = 5;
                b[LANES - 1] = <$lane>::MAX;
                let eq = V::splat(3).lanes_eq(V::load(&b));
                for lane in 0..LANES {
                    let expected = if lane == 4 || lane == LANES - 1 { 0 } else { <$lane>::MAX };
                    assert_eq!(eq[lane], expected, "lane {lane}");
                }

                // the mask feeds straight into blend and min/max results.
                let mut kept = V::splat(1);
                kept.blend(V::splat(2), eq);
                assert_eq!(kept[0], 1);
                assert_eq!(kept[4], 2);
            }

            #[test]
            fn test_debug_lists_lanes() {
                let text = format!("{:?}", V::splat(7));
                assert!(text.contains(stringify!($vector)));
                assert!(text.contains('7'));
            }
        }
    };
}

backend_properties!(u8x16, U8x16, u8);
backend_properties!(u16x16, U16x16, u16);

#[test]
fn test_backend_name_matches_build_target() {
    let expected = if cfg!(feature = "portable-simd") {
        "portable"
    } else if cfg!(any(
        target_arch = "x86_64",
        all(target_arch = "x86", target_feature = "sse2")
    )) {
        "sse2"
    } else if cfg!(target_arch = "aarch64") {
        "neon"
    } else {
        "portable"
    };
    assert_eq!(BACKEND_NAME, expected);
}

#[test]
fn test_lane_value_conversions() {
    assert_eq!(u8::from_count(255), Some(255));
    assert_eq!(u8::from_count(256), None);
    assert_eq!(u16::from_count(256), Some(256));
    assert_eq!(u16::from_count(70_000), None);
    assert_eq!(200u8.to_count(), 200);
}
