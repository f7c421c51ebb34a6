//! Groth16 verifying keys in their three shapes: the snarkjs JSON export, the
//! in-memory points, and the decimal string form the verifier contract takes.
//!
//! G2 coordinates are pairs `[c0, c1]` of base field elements, kept in the
//! same order snarkjs writes them and `ark_bn254::Fq2::new` takes them. The
//! contract expects each pair reversed, `[c1, c0]`.

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use serde::{Deserialize, Serialize};

use crate::error::DomainObjsError;
use crate::serde_types::{decimal_to_field, field_to_decimal_string};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G1Point {
    pub x: Fq,
    pub y: Fq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G2Point {
    pub x: [Fq; 2],
    pub y: [Fq; 2],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct G1ContractParam {
    pub x: String,
    pub y: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct G2ContractParam {
    pub x: [String; 2],
    pub y: [String; 2],
}

/// Verifying key as exported by `snarkjs zkey export verificationkey`.
/// Unknown fields (`protocol`, `curve`, `vk_alphabeta_12`, ..) are ignored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKeyJson {
    pub vk_alpha_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_gamma_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    pub ic: Vec<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKeyContractParam {
    pub alpha1: G1ContractParam,
    pub beta2: G2ContractParam,
    pub gamma2: G2ContractParam,
    pub delta2: G2ContractParam,
    pub ic: Vec<G1ContractParam>,
}

fn coordinate(values: &[String], index: usize, what: &str) -> Result<Fq, DomainObjsError> {
    let value = values.get(index).ok_or_else(|| {
        DomainObjsError::Serialization(format!("{what} is missing coordinate {index}"))
    })?;
    decimal_to_field(value)
}

fn pair(values: &[Vec<String>], index: usize, what: &str) -> Result<[Fq; 2], DomainObjsError> {
    let inner = values.get(index).ok_or_else(|| {
        DomainObjsError::Serialization(format!("{what} is missing coordinate {index}"))
    })?;
    Ok([coordinate(inner, 0, what)?, coordinate(inner, 1, what)?])
}

impl G1Point {
    pub fn new(x: Fq, y: Fq) -> Self {
        G1Point { x, y }
    }

    /// Reads `[x, y, ..]`, ignoring the projective `z`.
    pub fn from_strings(values: &[String]) -> Result<Self, DomainObjsError> {
        Ok(G1Point {
            x: coordinate(values, 0, "G1 point")?,
            y: coordinate(values, 1, "G1 point")?,
        })
    }

    pub fn to_strings(&self) -> Vec<String> {
        vec![
            field_to_decimal_string(&self.x),
            field_to_decimal_string(&self.y),
            String::from("1"),
        ]
    }

    /// The point as an arkworks affine point, checked to be on the curve.
    pub fn to_affine(&self) -> Result<G1Affine, DomainObjsError> {
        let point = G1Affine::new_unchecked(self.x, self.y);
        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(DomainObjsError::Validation(String::from("G1 point is not on the curve")));
        }
        Ok(point)
    }

    pub fn as_contract_param(&self) -> G1ContractParam {
        G1ContractParam {
            x: field_to_decimal_string(&self.x),
            y: field_to_decimal_string(&self.y),
        }
    }

    pub fn from_contract(param: &G1ContractParam) -> Result<Self, DomainObjsError> {
        Ok(G1Point {
            x: decimal_to_field(&param.x)?,
            y: decimal_to_field(&param.y)?,
        })
    }
}

impl G2Point {
    pub fn new(x: [Fq; 2], y: [Fq; 2]) -> Self {
        G2Point { x, y }
    }

    /// Reads `[[x_c0, x_c1], [y_c0, y_c1], ..]`.
    pub fn from_strings(values: &[Vec<String>]) -> Result<Self, DomainObjsError> {
        Ok(G2Point {
            x: pair(values, 0, "G2 point")?,
            y: pair(values, 1, "G2 point")?,
        })
    }

    pub fn to_strings(&self) -> Vec<Vec<String>> {
        vec![
            vec![field_to_decimal_string(&self.x[0]), field_to_decimal_string(&self.x[1])],
            vec![field_to_decimal_string(&self.y[0]), field_to_decimal_string(&self.y[1])],
            vec![String::from("1"), String::from("0")],
        ]
    }

    pub fn to_affine(&self) -> Result<G2Affine, DomainObjsError> {
        let point = G2Affine::new_unchecked(
            Fq2::new(self.x[0], self.x[1]),
            Fq2::new(self.y[0], self.y[1]),
        );
        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(DomainObjsError::Validation(String::from("G2 point is not on the curve")));
        }
        Ok(point)
    }

    pub fn as_contract_param(&self) -> G2ContractParam {
        G2ContractParam {
            x: [field_to_decimal_string(&self.x[1]), field_to_decimal_string(&self.x[0])],
            y: [field_to_decimal_string(&self.y[1]), field_to_decimal_string(&self.y[0])],
        }
    }

    pub fn from_contract(param: &G2ContractParam) -> Result<Self, DomainObjsError> {
        Ok(G2Point {
            x: [decimal_to_field(&param.x[1])?, decimal_to_field(&param.x[0])?],
            y: [decimal_to_field(&param.y[1])?, decimal_to_field(&param.y[0])?],
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    pub alpha1: G1Point,
    pub beta2: G2Point,
    pub gamma2: G2Point,
    pub delta2: G2Point,
    pub ic: Vec<G1Point>,
}

impl VerifyingKey {
    pub fn from_obj(data: &VerifyingKeyJson) -> Result<Self, DomainObjsError> {
        Ok(VerifyingKey {
            alpha1: G1Point::from_strings(&data.vk_alpha_1)?,
            beta2: G2Point::from_strings(&data.vk_beta_2)?,
            gamma2: G2Point::from_strings(&data.vk_gamma_2)?,
            delta2: G2Point::from_strings(&data.vk_delta_2)?,
            ic: data
                .ic
                .iter()
                .map(|p| G1Point::from_strings(p))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let data: VerifyingKeyJson = serde_json::from_str(json)?;
        Self::from_obj(&data)
    }

    pub fn to_obj(&self) -> VerifyingKeyJson {
        VerifyingKeyJson {
            vk_alpha_1: self.alpha1.to_strings(),
            vk_beta_2: self.beta2.to_strings(),
            vk_gamma_2: self.gamma2.to_strings(),
            vk_delta_2: self.delta2.to_strings(),
            ic: self.ic.iter().map(G1Point::to_strings).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(&self.to_obj())?)
    }

    /// Fails if any point of the key is off the curve.
    pub fn check_points(&self) -> Result<(), DomainObjsError> {
        self.alpha1.to_affine()?;
        self.beta2.to_affine()?;
        self.gamma2.to_affine()?;
        self.delta2.to_affine()?;
        for point in self.ic.iter() {
            point.to_affine()?;
        }
        Ok(())
    }

    pub fn as_contract_param(&self) -> VerifyingKeyContractParam {
        VerifyingKeyContractParam {
            alpha1: self.alpha1.as_contract_param(),
            beta2: self.beta2.as_contract_param(),
            gamma2: self.gamma2.as_contract_param(),
            delta2: self.delta2.as_contract_param(),
            ic: self.ic.iter().map(G1Point::as_contract_param).collect(),
        }
    }

    pub fn from_contract(param: &VerifyingKeyContractParam) -> Result<Self, DomainObjsError> {
        Ok(VerifyingKey {
            alpha1: G1Point::from_contract(&param.alpha1)?,
            beta2: G2Point::from_contract(&param.beta2)?,
            gamma2: G2Point::from_contract(&param.gamma2)?,
            delta2: G2Point::from_contract(&param.delta2)?,
            ic: param
                .ic
                .iter()
                .map(G1Point::from_contract)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::UniformRand;
    use rand::thread_rng;

    fn g1_from(point: G1Affine) -> G1Point {
        G1Point::new(point.x, point.y)
    }

    fn g2_from(point: G2Affine) -> G2Point {
        G2Point::new([point.x.c0, point.x.c1], [point.y.c0, point.y.c1])
    }

    fn sample_vk() -> VerifyingKey {
        let mut rng = thread_rng();
        let g1 = G1Affine::generator();
        let g2 = G2Affine::generator();
        let scalar = ark_bn254::Fr::rand(&mut rng);
        VerifyingKey {
            alpha1: g1_from((g1 * scalar).into_affine()),
            beta2: g2_from((g2 * scalar).into_affine()),
            gamma2: g2_from(g2),
            delta2: g2_from((g2 * (scalar + scalar)).into_affine()),
            ic: (0..3)
                .map(|_| g1_from((g1 * ark_bn254::Fr::rand(&mut rng)).into_affine()))
                .collect(),
        }
    }

    #[test]
    fn test_snarkjs_json_order() {
        let vk = sample_vk();
        let json = vk.to_json().unwrap();
        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["vk_beta_2"][0][0], field_to_decimal_string(&vk.beta2.x[0]));
        assert_eq!(raw["vk_beta_2"][1][1], field_to_decimal_string(&vk.beta2.y[1]));
        assert_eq!(raw["IC"].as_array().unwrap().len(), 3);

        let parsed = VerifyingKey::from_json(&json).unwrap();
        assert_eq!(parsed, vk);
        parsed.check_points().unwrap();
    }

    #[test]
    fn test_contract_swaps_g2_pairs() {
        let vk = sample_vk();
        let param = vk.as_contract_param();
        assert_eq!(param.gamma2.x[0], field_to_decimal_string(&vk.gamma2.x[1]));
        assert_eq!(param.gamma2.x[1], field_to_decimal_string(&vk.gamma2.x[0]));
        assert_eq!(param.alpha1.x, field_to_decimal_string(&vk.alpha1.x));
        assert_eq!(VerifyingKey::from_contract(&param).unwrap(), vk);
    }

    #[test]
    fn test_equality_and_copy() {
        let vk = sample_vk();
        let mut copy = vk.clone();
        assert_eq!(copy, vk);
        copy.alpha1.x = Fq::from(123u64);
        assert_ne!(copy, vk);
        assert!(copy.check_points().is_err());

        let mut shorter = vk.clone();
        shorter.ic.pop();
        assert_ne!(shorter, vk);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let mut data = sample_vk().to_obj();
        data.vk_alpha_1[0] = String::from(
            "21888242871839275222246405745257275088696311157297823662689037894645226208583",
        );
        assert!(VerifyingKey::from_obj(&data).is_err());
        data.vk_alpha_1.truncate(1);
        assert!(VerifyingKey::from_obj(&data).is_err());
    }
}
