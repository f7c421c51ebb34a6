//! Baby jubjub, the twisted Edwards curve `168700*x^2 + y^2 = 1 + 168696*x^2*y^2`
//! over the BN254 scalar field.
//!
//! The group law comes from `ark_ec`; this module only fixes the curve
//! parameters and the 32-byte point compression the circuits and serialized
//! keys use. `Base8` generates the prime order subgroup.

use ark_ec::twisted_edwards::{Affine, MontCurveConfig, TECurveConfig};
use ark_ec::{AffineRepr, CurveConfig, CurveGroup};
use ark_ff::{BigInteger, MontFp, PrimeField};
use num_bigint::BigUint;

use crate::error::CryptoError;
use crate::utils::field_from_biguint;
use crate::Fr;

/// Scalar field of the prime order subgroup.
pub type SubgroupScalar = ark_ed_on_bn254::Fr;

const BASE8_X: Fr =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const BASE8_Y: Fr =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

const GENERATOR_X: Fr =
    MontFp!("995203441582195749578291179787384436505546430278305826713579947235728471134");
const GENERATOR_Y: Fr =
    MontFp!("5472060717959818805561601436314318772137091100104008585924551046643952123905");

#[derive(Clone, Default, PartialEq, Eq)]
pub struct BabyJubConfig;

impl CurveConfig for BabyJubConfig {
    type BaseField = Fr;
    type ScalarField = SubgroupScalar;

    const COFACTOR: &'static [u64] = &[8];

    // 8^{-1} mod the subgroup order
    const COFACTOR_INV: SubgroupScalar =
        MontFp!("2394026564107420727433200628387514462817212225638746351800188703329891451411");
}

impl TECurveConfig for BabyJubConfig {
    const COEFF_A: Fr = MontFp!("168700");
    const COEFF_D: Fr = MontFp!("168696");
    const GENERATOR: Point = Point::new_unchecked(BASE8_X, BASE8_Y);

    type MontCurveConfig = BabyJubConfig;
}

impl MontCurveConfig for BabyJubConfig {
    const COEFF_A: Fr = MontFp!("168698");
    const COEFF_B: Fr = MontFp!("1");

    type TECurveConfig = BabyJubConfig;
}

pub type Point = Affine<BabyJubConfig>;

/// Generator of the prime order subgroup, `8 * generator()`.
pub fn base8() -> Point {
    <BabyJubConfig as TECurveConfig>::GENERATOR
}

/// Generator of the full curve group.
pub fn generator() -> Point {
    Point::new_unchecked(GENERATOR_X, GENERATOR_Y)
}

/// Order of the prime subgroup generated by [`base8`].
pub fn sub_order() -> BigUint {
    SubgroupScalar::MODULUS.into()
}

/// `scalar * point` with the scalar taken as a plain integer, so points
/// outside the subgroup are multiplied without reducing the scalar.
///
/// `point` must be on the curve.
pub fn mul_scalar(point: &Point, scalar: &BigUint) -> Point {
    point.mul_bigint(scalar.to_u64_digits()).into_affine()
}

/// Compresses the point into 32 bytes: `y` little-endian with the sign of
/// `x` (whether `x > (r - 1) / 2`) stored in the most significant bit.
pub fn pack_point(point: &Point) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&point.y.into_bigint().to_bytes_le());
    if point.x.into_bigint() > Fr::MODULUS_MINUS_ONE_DIV_TWO {
        out[31] |= 0x80;
    }
    out
}

pub fn unpack_point(packed: &[u8; 32]) -> Result<Point, CryptoError> {
    let mut y_bytes = *packed;
    let sign = y_bytes[31] & 0x80 != 0;
    y_bytes[31] &= 0x7F;

    let y: Fr = field_from_biguint(&BigUint::from_bytes_le(&y_bytes))?;
    let (low, high) = Point::get_xs_from_y_unchecked(y).ok_or(CryptoError::PointNotOnCurve)?;
    let point = Point::new_unchecked(if sign { high } else { low }, y);
    if !point.is_on_curve() {
        return Err(CryptoError::PointNotOnCurve);
    }
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{UniformRand, Zero};
    use rand::thread_rng;

    #[test]
    fn test_constants_are_on_curve() {
        assert!(base8().is_on_curve());
        assert!(base8().is_in_correct_subgroup_assuming_on_curve());
        assert!(generator().is_on_curve());
        assert!(!generator().is_in_correct_subgroup_assuming_on_curve());
        assert_eq!(mul_scalar(&generator(), &BigUint::from(8u32)), base8());
    }

    #[test]
    fn test_subgroup_order() {
        let order = sub_order();
        assert!(mul_scalar(&base8(), &order).is_zero());
        let expected = BigUint::parse_bytes(
            b"2736030358979909402780800718157159386076813972158567259200215660948447373041",
            10,
        )
        .unwrap();
        assert_eq!(order, expected);
        assert_eq!(
            <BabyJubConfig as CurveConfig>::COFACTOR_INV * SubgroupScalar::from(8u64),
            SubgroupScalar::from(1u64)
        );
    }

    #[test]
    fn test_integer_and_field_scalars_agree() {
        let mut rng = thread_rng();
        let k = SubgroupScalar::rand(&mut rng);
        let by_field = (base8() * k).into_affine();
        assert_eq!(mul_scalar(&base8(), &k.into()), by_field);
        assert_eq!(mul_scalar(&base8(), &(BigUint::from(k) + sub_order())), by_field);
        assert!(mul_scalar(&base8(), &BigUint::from(0u32)).is_zero());
    }

    #[test]
    fn test_group_law() {
        let mut rng = thread_rng();
        let a = (base8() * SubgroupScalar::rand(&mut rng)).into_affine();
        let b = (base8() * SubgroupScalar::rand(&mut rng)).into_affine();
        assert_eq!((a + b).into_affine(), (b + a).into_affine());
        assert!((a + (-a)).is_zero());
        assert!((a + b).into_affine().is_on_curve());
    }

    #[test]
    fn test_pack_unpack() {
        let mut rng = thread_rng();
        for _ in 0..8 {
            let p = (base8() * SubgroupScalar::rand(&mut rng)).into_affine();
            assert_eq!(unpack_point(&pack_point(&p)).unwrap(), p);
            assert_eq!(unpack_point(&pack_point(&-p)).unwrap(), -p);
        }
    }

    #[test]
    fn test_unpack_rejects_large_y() {
        let packed = [0x7Fu8; 32];
        assert!(unpack_point(&packed).is_err());
    }
}
