//! Little-endian binary encoding of Groth16 proving keys and witnesses for
//! native provers.
//!
//! A proving key is laid out as a 40 byte header (`nVars`, `nPublic`,
//! `domainSize` and seven section pointers), the five fixed key points, the
//! sparse `A` and `B` polynomials, then the `A`, `B1`, `B2`, `C` and `hExps`
//! point sections. Base and scalar field values are written in Montgomery
//! form as eight little-endian `u32` words. Witness values are written as
//! plain little-endian integers.

use std::collections::BTreeMap;

use ark_bn254::Fq;
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use maci_crypto::Fr;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DomainObjsError;
use crate::serde_types::decimal_to_field;
use crate::verifying_key::{G1Point, G2Point};

const HEADER_LEN: usize = 40;
const FIELD_LEN: usize = 32;
const G1_LEN: usize = 2 * FIELD_LEN;
const G2_LEN: usize = 4 * FIELD_LEN;

/// Proving key as exported by snarkjs (`proving_key.json`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProvingKeyJson {
    #[serde(rename = "nVars")]
    pub n_vars: usize,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    #[serde(rename = "domainSize")]
    pub domain_size: usize,
    #[serde(rename = "polsA")]
    pub pols_a: Vec<BTreeMap<u32, String>>,
    #[serde(rename = "polsB")]
    pub pols_b: Vec<BTreeMap<u32, String>>,
    #[serde(rename = "A")]
    pub a: Vec<Vec<String>>,
    #[serde(rename = "B1")]
    pub b1: Vec<Vec<String>>,
    #[serde(rename = "B2")]
    pub b2: Vec<Vec<Vec<String>>>,
    /// The first `nPublic + 1` entries are unused and usually `null`.
    #[serde(rename = "C")]
    pub c: Vec<Option<Vec<String>>>,
    #[serde(rename = "hExps")]
    pub h_exps: Vec<Vec<String>>,
    pub vk_alfa_1: Vec<String>,
    pub vk_beta_1: Vec<String>,
    pub vk_delta_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
}

/// Sparse polynomial: coefficient per constraint index, in key order.
pub type SparsePolynomial = BTreeMap<u32, Fr>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvingKey {
    pub n_vars: usize,
    pub n_public: usize,
    pub domain_size: usize,
    pub pols_a: Vec<SparsePolynomial>,
    pub pols_b: Vec<SparsePolynomial>,
    pub a: Vec<G1Point>,
    pub b1: Vec<G1Point>,
    pub b2: Vec<G2Point>,
    pub c: Vec<Option<G1Point>>,
    pub h_exps: Vec<G1Point>,
    pub vk_alfa_1: G1Point,
    pub vk_beta_1: G1Point,
    pub vk_delta_1: G1Point,
    pub vk_beta_2: G2Point,
    pub vk_delta_2: G2Point,
}

fn montgomery_r<F: PrimeField>() -> F {
    F::from(2u64).pow([256u64])
}

/// `x * 2^256 mod p`
pub fn to_montgomery<F: PrimeField>(x: &F) -> F {
    *x * montgomery_r::<F>()
}

/// `x * 2^-256 mod p`
pub fn from_montgomery<F: PrimeField>(x: &F) -> F {
    // 2^256 is a unit in any odd prime field
    let r_inv = montgomery_r::<F>().inverse().unwrap_or_else(F::zero);
    *x * r_inv
}

fn check_len(what: &str, actual: usize, required: usize) -> Result<(), DomainObjsError> {
    if actual < required {
        return Err(DomainObjsError::Validation(format!(
            "{what} has {actual} entries, expected at least {required}"
        )));
    }
    Ok(())
}

fn parse_polynomials(pols: &[BTreeMap<u32, String>]) -> Result<Vec<SparsePolynomial>, DomainObjsError> {
    pols.iter()
        .map(|pol| {
            pol.iter()
                .map(|(key, value)| -> Result<(u32, Fr), DomainObjsError> {
                    Ok((*key, decimal_to_field(value)?))
                })
                .collect::<Result<SparsePolynomial, DomainObjsError>>()
        })
        .collect()
}

fn parse_g1s(points: &[Vec<String>]) -> Result<Vec<G1Point>, DomainObjsError> {
    points.iter().map(|p| G1Point::from_strings(p)).collect()
}

impl ProvingKey {
    pub fn from_obj(data: &ProvingKeyJson) -> Result<Self, DomainObjsError> {
        let n_vars = data.n_vars;
        if data.n_public + 1 > n_vars {
            return Err(DomainObjsError::Validation(format!(
                "nPublic ({}) must be smaller than nVars ({n_vars})",
                data.n_public
            )));
        }
        check_len("polsA", data.pols_a.len(), n_vars)?;
        check_len("polsB", data.pols_b.len(), n_vars)?;
        check_len("A", data.a.len(), n_vars)?;
        check_len("B1", data.b1.len(), n_vars)?;
        check_len("B2", data.b2.len(), n_vars)?;
        check_len("C", data.c.len(), n_vars)?;
        check_len("hExps", data.h_exps.len(), data.domain_size)?;

        let c = data
            .c
            .iter()
            .enumerate()
            .map(|(i, p)| match p {
                Some(p) => G1Point::from_strings(p).map(Some),
                None if i <= data.n_public => Ok(None),
                None => Err(DomainObjsError::Validation(format!("C[{i}] is missing"))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProvingKey {
            n_vars,
            n_public: data.n_public,
            domain_size: data.domain_size,
            pols_a: parse_polynomials(&data.pols_a[..n_vars])?,
            pols_b: parse_polynomials(&data.pols_b[..n_vars])?,
            a: parse_g1s(&data.a[..n_vars])?,
            b1: parse_g1s(&data.b1[..n_vars])?,
            b2: data.b2[..n_vars]
                .iter()
                .map(|p| G2Point::from_strings(p))
                .collect::<Result<Vec<_>, _>>()?,
            c,
            h_exps: parse_g1s(&data.h_exps[..data.domain_size])?,
            vk_alfa_1: G1Point::from_strings(&data.vk_alfa_1)?,
            vk_beta_1: G1Point::from_strings(&data.vk_beta_1)?,
            vk_delta_1: G1Point::from_strings(&data.vk_delta_1)?,
            vk_beta_2: G2Point::from_strings(&data.vk_beta_2)?,
            vk_delta_2: G2Point::from_strings(&data.vk_delta_2)?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let data: ProvingKeyJson = serde_json::from_str(json)?;
        Self::from_obj(&data)
    }
}

fn polynomial_len(pol: &SparsePolynomial) -> usize {
    4 + pol.len() * (4 + FIELD_LEN)
}

/// Size in bytes of the binary proving key.
pub fn calculate_buff_len(pk: &ProvingKey) -> usize {
    let mut size = HEADER_LEN;
    size += 3 * G1_LEN;
    size += 2 * G2_LEN;

    size += pk.pols_a.iter().take(pk.n_vars).map(polynomial_len).sum::<usize>();
    size += pk.pols_b.iter().take(pk.n_vars).map(polynomial_len).sum::<usize>();

    size += pk.n_vars * G1_LEN;
    size += pk.n_vars * G1_LEN;
    size += pk.n_vars * G2_LEN;
    size += pk.n_vars.saturating_sub(pk.n_public + 1) * G1_LEN;
    size += pk.domain_size * G1_LEN;
    size
}

/// Size in bytes of the binary witness.
pub fn calculate_witness_len(witness: &[Fr]) -> usize {
    witness.len() * FIELD_LEN
}

struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    fn with_capacity(len: usize) -> Self {
        BinaryWriter { buf: Vec::with_capacity(len) }
    }

    fn offset(&self) -> usize {
        self.buf.len()
    }

    fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn write_len(&mut self, value: usize) -> Result<(), DomainObjsError> {
        let value = u32::try_from(value).map_err(|_| {
            DomainObjsError::Validation(format!("{value} does not fit in a u32 header field"))
        })?;
        self.write_u32(value);
        Ok(())
    }

    /// Reserves a u32 slot to be patched with a section offset.
    fn alloc_pointer(&mut self) -> usize {
        let at = self.offset();
        self.write_u32(0);
        at
    }

    fn patch_pointer(&mut self, at: usize) -> Result<(), DomainObjsError> {
        let here = u32::try_from(self.offset()).map_err(|_| {
            DomainObjsError::Validation(String::from("binary proving key exceeds 4 GiB"))
        })?;
        self.buf[at..at + 4].copy_from_slice(&here.to_le_bytes());
        Ok(())
    }

    fn write_field<F: PrimeField>(&mut self, value: &F) {
        let bytes = value.into_bigint().to_bytes_le();
        self.buf.extend_from_slice(&bytes);
        self.buf.resize(self.buf.len() + FIELD_LEN - bytes.len(), 0);
    }

    fn write_point(&mut self, p: &G1Point) {
        self.write_field(&to_montgomery::<Fq>(&p.x));
        self.write_field(&to_montgomery::<Fq>(&p.y));
    }

    fn write_point2(&mut self, p: &G2Point) {
        self.write_field(&to_montgomery::<Fq>(&p.x[0]));
        self.write_field(&to_montgomery::<Fq>(&p.x[1]));
        self.write_field(&to_montgomery::<Fq>(&p.y[0]));
        self.write_field(&to_montgomery::<Fq>(&p.y[1]));
    }

    fn write_polynomial(&mut self, pol: &SparsePolynomial) -> Result<(), DomainObjsError> {
        self.write_len(pol.len())?;
        for (key, coefficient) in pol.iter() {
            self.write_u32(*key);
            self.write_field(&to_montgomery::<Fr>(coefficient));
        }
        Ok(())
    }

    fn finish(self, expected: usize) -> Result<Vec<u8>, DomainObjsError> {
        if self.buf.len() != expected {
            return Err(DomainObjsError::BufferLayout { expected, actual: self.buf.len() });
        }
        Ok(self.buf)
    }
}

pub fn pk_to_binary(pk: &ProvingKey) -> Result<Vec<u8>, DomainObjsError> {
    let buff_len = calculate_buff_len(pk);
    let mut h = BinaryWriter::with_capacity(buff_len);

    h.write_len(pk.n_vars)?;
    h.write_len(pk.n_public)?;
    h.write_len(pk.domain_size)?;
    let p_pols_a = h.alloc_pointer();
    let p_pols_b = h.alloc_pointer();
    let p_points_a = h.alloc_pointer();
    let p_points_b1 = h.alloc_pointer();
    let p_points_b2 = h.alloc_pointer();
    let p_points_c = h.alloc_pointer();
    let p_points_h_exps = h.alloc_pointer();

    h.write_point(&pk.vk_alfa_1);
    h.write_point(&pk.vk_beta_1);
    h.write_point(&pk.vk_delta_1);
    h.write_point2(&pk.vk_beta_2);
    h.write_point2(&pk.vk_delta_2);

    h.patch_pointer(p_pols_a)?;
    for pol in pk.pols_a.iter().take(pk.n_vars) {
        h.write_polynomial(pol)?;
    }

    h.patch_pointer(p_pols_b)?;
    for pol in pk.pols_b.iter().take(pk.n_vars) {
        h.write_polynomial(pol)?;
    }

    h.patch_pointer(p_points_a)?;
    for p in pk.a.iter().take(pk.n_vars) {
        h.write_point(p);
    }

    h.patch_pointer(p_points_b1)?;
    for p in pk.b1.iter().take(pk.n_vars) {
        h.write_point(p);
    }

    h.patch_pointer(p_points_b2)?;
    for p in pk.b2.iter().take(pk.n_vars) {
        h.write_point2(p);
    }

    h.patch_pointer(p_points_c)?;
    for i in pk.n_public + 1..pk.n_vars {
        let p = pk.c.get(i).copied().flatten().ok_or_else(|| {
            DomainObjsError::Validation(format!("C[{i}] is missing"))
        })?;
        h.write_point(&p);
    }

    h.patch_pointer(p_points_h_exps)?;
    for p in pk.h_exps.iter().take(pk.domain_size) {
        h.write_point(p);
    }

    let out = h.finish(buff_len)?;
    info!(n_vars = pk.n_vars, domain_size = pk.domain_size, bytes = out.len(), "binarified proving key");
    Ok(out)
}

pub fn witness_to_binary(witness: &[Fr]) -> Result<Vec<u8>, DomainObjsError> {
    let buff_len = calculate_witness_len(witness);
    let mut h = BinaryWriter::with_capacity(buff_len);
    for value in witness {
        h.write_field(value);
    }
    let out = h.finish(buff_len)?;
    debug!(values = witness.len(), bytes = out.len(), "binarified witness");
    Ok(out)
}

/// Parses decimal witness values (as written by `snarkjs wtns export json`).
pub fn witness_from_strings(values: &[String]) -> Result<Vec<Fr>, DomainObjsError> {
    values.iter().map(|v| decimal_to_field(v)).collect()
}

/// Encodes several proving keys in parallel.
pub fn binarify_many(keys: &[ProvingKey]) -> Result<Vec<Vec<u8>>, DomainObjsError> {
    keys.par_iter().map(pk_to_binary).collect()
}
