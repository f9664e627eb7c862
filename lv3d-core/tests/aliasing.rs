use lv3d_core::matrix::{invert_m, multiply_mm, multiply_mv, Operand};
use lv3d_core::Matrix4;
use proptest::prelude::*;

const BUF_LEN: usize = 48;
const MAX_OFFSET: usize = BUF_LEN - 16;

fn block(buf: &[f64], offset: usize) -> [f64; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(&buf[offset..offset + 16]);
    out
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

/// Product of copies of the two blocks, written to a fresh buffer.
fn reference_product(buf: &[f64], lhs_offset: usize, rhs_offset: usize) -> [f64; 16] {
    let lhs = block(buf, lhs_offset);
    let rhs = block(buf, rhs_offset);
    let mut out = [0.0; 16];
    multiply_mm(&mut out, 0, Operand::Slice(&lhs, 0), Operand::Slice(&rhs, 0)).unwrap();
    out
}

fn well_conditioned() -> impl Strategy<Value = Matrix4> {
    (
        -180.0f64..180.0,
        (-1.0f64..1.0, -1.0f64..1.0, 0.1f64..1.0),
        (0.5f64..2.0, 0.5f64..2.0, 0.5f64..2.0),
        (-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0),
    )
        .prop_map(|(angle, (ax, ay, az), (sx, sy, sz), (tx, ty, tz))| {
            Matrix4::IDENTITY
                .translated(tx, ty, tz)
                .rotated(angle, ax, ay, az)
                .scaled(sx, sy, sz)
        })
}

proptest! {
    #[test]
    fn aliased_product_is_bit_identical(
        values in prop::collection::vec(-100.0f64..100.0, BUF_LEN),
        result_offset in 0..=MAX_OFFSET,
        lhs_offset in 0..=MAX_OFFSET,
        rhs_offset in 0..=MAX_OFFSET,
    ) {
        let expected = reference_product(&values, lhs_offset, rhs_offset);

        let mut buf = values.clone();
        multiply_mm(
            &mut buf,
            result_offset,
            Operand::Dest(lhs_offset),
            Operand::Dest(rhs_offset),
        )
        .unwrap();

        prop_assert_eq!(bits(&buf[result_offset..result_offset + 16]), bits(&expected));
        // Nothing outside the result block moves
        prop_assert_eq!(bits(&buf[..result_offset]), bits(&values[..result_offset]));
        prop_assert_eq!(bits(&buf[result_offset + 16..]), bits(&values[result_offset + 16..]));
    }

    #[test]
    fn mixed_operands_are_bit_identical(
        values in prop::collection::vec(-100.0f64..100.0, BUF_LEN),
        other in prop::array::uniform16(-100.0f64..100.0),
        result_offset in 0..=MAX_OFFSET,
        lhs_offset in 0..=MAX_OFFSET,
    ) {
        let lhs = block(&values, lhs_offset);
        let mut expected = [0.0; 16];
        multiply_mm(&mut expected, 0, Operand::Slice(&lhs, 0), Operand::Slice(&other, 0)).unwrap();

        let mut buf = values.clone();
        multiply_mm(&mut buf, result_offset, Operand::Dest(lhs_offset), Operand::Slice(&other, 0))
            .unwrap();
        prop_assert_eq!(bits(&buf[result_offset..result_offset + 16]), bits(&expected));
    }

    #[test]
    fn aliased_matrix_vector_is_bit_identical(
        values in prop::collection::vec(-100.0f64..100.0, BUF_LEN),
        result_offset in 0..=BUF_LEN - 4,
        m_offset in 0..=MAX_OFFSET,
        v_offset in 0..=BUF_LEN - 4,
    ) {
        let m = block(&values, m_offset);
        let v = [
            values[v_offset],
            values[v_offset + 1],
            values[v_offset + 2],
            values[v_offset + 3],
        ];
        let mut expected = [0.0; 4];
        multiply_mv(&mut expected, 0, Operand::Slice(&m, 0), Operand::Slice(&v, 0)).unwrap();

        let mut buf = values.clone();
        multiply_mv(&mut buf, result_offset, Operand::Dest(m_offset), Operand::Dest(v_offset))
            .unwrap();
        prop_assert_eq!(bits(&buf[result_offset..result_offset + 4]), bits(&expected));
    }

    #[test]
    fn inverse_times_matrix_is_identity(m in well_conditioned()) {
        let mut inv = [0.0; 16];
        prop_assert!(invert_m(&mut inv, 0, m.as_slice(), 0).unwrap());

        let mut product = [0.0; 16];
        multiply_mm(&mut product, 0, Operand::Slice(m.as_slice(), 0), Operand::Slice(&inv, 0))
            .unwrap();
        for (i, value) in product.iter().enumerate() {
            let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
            prop_assert!((value - expected).abs() < 1e-9, "entry {}: {}", i, value);
        }
    }

    #[test]
    fn product_matches_nalgebra(
        a in prop::array::uniform16(-10.0f64..10.0),
        b in prop::array::uniform16(-10.0f64..10.0),
    ) {
        let mut out = [0.0; 16];
        multiply_mm(&mut out, 0, Operand::Slice(&a, 0), Operand::Slice(&b, 0)).unwrap();

        let oracle =
            nalgebra::Matrix4::from_column_slice(&a) * nalgebra::Matrix4::from_column_slice(&b);
        for (ours, theirs) in out.iter().zip(oracle.as_slice()) {
            prop_assert!((ours - theirs).abs() < 1e-9, "{} vs {}", ours, theirs);
        }
    }

    #[test]
    fn inverse_matches_nalgebra(m in well_conditioned()) {
        let inverse = m.inverse();
        prop_assert!(inverse.is_some());
        let oracle = nalgebra::Matrix4::from(m).try_inverse();
        prop_assert!(oracle.is_some());

        if let (Some(ours), Some(theirs)) = (inverse, oracle) {
            for (a, b) in ours.as_slice().iter().zip(theirs.as_slice()) {
                prop_assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
            }
        }
    }
}
