//! Refinement type lattice over integers and integer lists.
//!
//! A [`Ty`] is a normalized, closed-form type: a base tag plus optional
//! refinements with explicit pairwise interaction rules. Declared types on
//! subroutine descriptors are [`TyExpr`] values whose numeric arguments may
//! name the `k`/`n` parameters; resolution substitutes static parameters and
//! lowers the output-only tags (`same-length`, `no-smaller`, `element`) into
//! closed form, so a stored `Ty` never contains them.

use crate::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Base {
    Any,
    Int,
    IntList,
}

impl Base {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Int => "int",
            Self::IntList => "int-list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sign {
    NonNegative,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parity {
    Even,
    Odd,
}

/// Length constraint for list types. `AtLeast(0)` normalizes to `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Length {
    Free,
    AtLeast(usize),
    Exact(usize),
}

impl Length {
    #[must_use]
    pub fn lower_bound(self) -> usize {
        match self {
            Self::Free => 0,
            Self::AtLeast(n) | Self::Exact(n) => n,
        }
    }
}

/// A normalized refinement type. Integer refinements apply elementwise when
/// `base` is `IntList`; `divisor_of` is int-only, `length`/`sorted` are
/// list-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ty {
    pub base: Base,
    pub sign: Option<Sign>,
    pub parity: Option<Parity>,
    pub divisor_of: Option<i64>,
    pub multiple_of: Option<i64>,
    pub range: Option<(i64, i64)>,
    pub length: Length,
    pub sorted: bool,
}

impl Ty {
    #[must_use]
    pub const fn with_base(base: Base) -> Self {
        Self {
            base,
            sign: None,
            parity: None,
            divisor_of: None,
            multiple_of: None,
            range: None,
            length: Length::Free,
            sorted: false,
        }
    }

    /// The lattice top: unconstrained, inhabited by every value.
    #[must_use]
    pub const fn any() -> Self {
        Self::with_base(Base::Any)
    }

    #[must_use]
    pub const fn int() -> Self {
        Self::with_base(Base::Int)
    }

    #[must_use]
    pub const fn int_list() -> Self {
        Self::with_base(Base::IntList)
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        *self == Self::any()
    }

    /// Greatest lower bound. `None` is the bottom element.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let ty = Self {
            base: meet_base(self.base, other.base)?,
            sign: meet_sign(self.sign, other.sign)?,
            parity: meet_parity(self.parity, other.parity)?,
            divisor_of: meet_divisor(self.divisor_of, other.divisor_of),
            multiple_of: meet_multiple(self.multiple_of, other.multiple_of)?,
            range: meet_range(self.range, other.range)?,
            length: meet_length(self.length, other.length)?,
            sorted: self.sorted || other.sorted,
        };
        ty.is_satisfiable().then_some(ty)
    }

    /// Inference-time narrowing: merge the refinements a consumer demands
    /// into what is already known about a producer, discarding an
    /// unconstrained `old`.
    #[must_use]
    pub fn meet_into(old: &Self, new: &Self) -> Option<Self> {
        if old.is_any() {
            return Some(*new);
        }
        old.intersect(new)
    }

    /// `self ≤ other`: every refinement demanded by `other` is implied.
    #[must_use]
    pub fn subtype(&self, other: &Self) -> bool {
        match (self.base, other.base) {
            (_, Base::Any) => {}
            (a, b) if a == b => {}
            _ => return false,
        }

        if let Some(want) = other.sign {
            match self.effective_sign() {
                Some(have) if sign_implies(have, want) => {}
                _ => return false,
            }
        }
        if let Some(want) = other.parity {
            if self.effective_parity() != Some(want) {
                return false;
            }
        }
        if let Some(want) = other.multiple_of {
            match self.multiple_of {
                Some(have) if have % want == 0 => {}
                _ => return false,
            }
        }
        if let Some(want) = other.divisor_of {
            match self.divisor_of {
                Some(have) if want % have == 0 => {}
                _ => return false,
            }
        }
        if let Some((want_lo, want_hi)) = other.range {
            match self.range {
                Some((lo, hi)) if lo >= want_lo && hi <= want_hi => {}
                _ => return false,
            }
        }
        match (self.length, other.length) {
            (_, Length::Free) => {}
            (Length::AtLeast(have) | Length::Exact(have), Length::AtLeast(want))
                if have >= want => {}
            (Length::Exact(have), Length::Exact(want)) if have == want => {}
            _ => return false,
        }
        !other.sorted || self.sorted
    }

    /// `inhabits`: does the concrete value satisfy every refinement?
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match value {
            Value::Int(x) => {
                if self.base == Base::IntList {
                    return false;
                }
                if self.length != Length::Free || self.sorted {
                    return false;
                }
                self.element_ok(*x) && self.divisor_ok(*x)
            }
            Value::List(items) => {
                if self.base == Base::Int || self.divisor_of.is_some() {
                    return false;
                }
                let length_ok = match self.length {
                    Length::Free => true,
                    Length::AtLeast(n) => items.len() >= n,
                    Length::Exact(n) => items.len() == n,
                };
                length_ok
                    && (!self.sorted || items.windows(2).all(|w| w[0] <= w[1]))
                    && items.iter().all(|x| self.element_ok(*x))
            }
        }
    }

    fn element_ok(&self, x: i64) -> bool {
        let sign_ok = match self.sign {
            None => true,
            Some(Sign::NonNegative) => x >= 0,
            Some(Sign::Positive) => x > 0,
            Some(Sign::Negative) => x < 0,
        };
        let parity_ok = match self.parity {
            None => true,
            Some(Parity::Even) => x % 2 == 0,
            Some(Parity::Odd) => x % 2 != 0,
        };
        let multiple_ok = self.multiple_of.is_none_or(|m| x % m == 0);
        let range_ok = self.range.is_none_or(|(lo, hi)| lo <= x && x <= hi);
        sign_ok && parity_ok && multiple_ok && range_ok
    }

    fn divisor_ok(&self, x: i64) -> bool {
        self.divisor_of.is_none_or(|k| x != 0 && k % x == 0)
    }

    fn effective_sign(&self) -> Option<Sign> {
        if self.sign.is_some() {
            return self.sign;
        }
        match self.range {
            Some((lo, _)) if lo >= 1 => Some(Sign::Positive),
            Some((lo, _)) if lo >= 0 => Some(Sign::NonNegative),
            Some((_, hi)) if hi <= -1 => Some(Sign::Negative),
            _ => None,
        }
    }

    fn effective_parity(&self) -> Option<Parity> {
        if self.parity.is_some() {
            return self.parity;
        }
        match self.multiple_of {
            Some(m) if m % 2 == 0 => Some(Parity::Even),
            _ => None,
        }
    }

    fn is_satisfiable(&self) -> bool {
        if let Some((lo, hi)) = self.range {
            if lo > hi {
                return false;
            }
            match self.sign {
                Some(Sign::Positive) if hi < 1 => return false,
                Some(Sign::NonNegative) if hi < 0 => return false,
                Some(Sign::Negative) if lo > -1 => return false,
                _ => {}
            }
            if lo == hi {
                match self.parity {
                    Some(Parity::Even) if lo % 2 != 0 => return false,
                    Some(Parity::Odd) if lo % 2 == 0 => return false,
                    _ => {}
                }
            }
        }
        true
    }
}

fn meet_base(a: Base, b: Base) -> Option<Base> {
    match (a, b) {
        (Base::Any, other) | (other, Base::Any) => Some(other),
        (a, b) if a == b => Some(a),
        _ => None,
    }
}

fn meet_sign(a: Option<Sign>, b: Option<Sign>) -> Option<Option<Sign>> {
    match (a, b) {
        (None, s) | (s, None) => Some(s),
        (Some(a), Some(b)) if a == b => Some(Some(a)),
        (Some(Sign::Positive), Some(Sign::NonNegative))
        | (Some(Sign::NonNegative), Some(Sign::Positive)) => Some(Some(Sign::Positive)),
        _ => None,
    }
}

fn meet_parity(a: Option<Parity>, b: Option<Parity>) -> Option<Option<Parity>> {
    match (a, b) {
        (None, p) | (p, None) => Some(p),
        (Some(a), Some(b)) if a == b => Some(Some(a)),
        _ => None,
    }
}

// Dividing both bounds is sound: v | a and v | b iff v | gcd(a, b).
fn meet_divisor(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (None, d) | (d, None) => d,
        (Some(a), Some(b)) => Some(gcd(a, b)),
    }
}

fn meet_multiple(a: Option<i64>, b: Option<i64>) -> Option<Option<i64>> {
    match (a, b) {
        (None, m) | (m, None) => Some(m),
        // a | v and b | v iff lcm(a, b) | v; overflow is treated as bottom.
        (Some(a), Some(b)) => {
            let g = gcd(a, b);
            (a / g).checked_mul(b).map(Some)
        }
    }
}

fn meet_range(
    a: Option<(i64, i64)>,
    b: Option<(i64, i64)>,
) -> Option<Option<(i64, i64)>> {
    match (a, b) {
        (None, r) | (r, None) => Some(r),
        (Some((alo, ahi)), Some((blo, bhi))) => {
            let lo = alo.max(blo);
            let hi = ahi.min(bhi);
            (lo <= hi).then_some(Some((lo, hi)))
        }
    }
}

fn meet_length(a: Length, b: Length) -> Option<Length> {
    let met = match (a, b) {
        (Length::Free, l) | (l, Length::Free) => l,
        (Length::Exact(n), Length::Exact(m)) => {
            if n != m {
                return None;
            }
            Length::Exact(n)
        }
        (Length::Exact(n), Length::AtLeast(m)) | (Length::AtLeast(m), Length::Exact(n)) => {
            if n < m {
                return None;
            }
            Length::Exact(n)
        }
        (Length::AtLeast(n), Length::AtLeast(m)) => Length::AtLeast(n.max(m)),
    };
    Some(normalize_length(met))
}

fn normalize_length(length: Length) -> Length {
    match length {
        Length::AtLeast(0) => Length::Free,
        other => other,
    }
}

fn sign_implies(have: Sign, want: Sign) -> bool {
    have == want || (have == Sign::Positive && want == Sign::NonNegative)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

// ── Declared types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamName {
    K,
    N,
}

impl ParamName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::K => "k",
            Self::N => "n",
        }
    }
}

/// Static parameter bindings for one node. First parameter wire binds `k`,
/// second binds `n`; primitives accept no other names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub k: Option<i64>,
    pub n: Option<i64>,
}

impl Params {
    #[must_use]
    pub fn get(&self, name: ParamName) -> Option<i64> {
        match name {
            ParamName::K => self.k,
            ParamName::N => self.n,
        }
    }

    pub fn set(&mut self, name: ParamName, value: i64) {
        match name {
            ParamName::K => self.k = Some(value),
            ParamName::N => self.n = Some(value),
        }
    }

    #[must_use]
    pub fn with_k(k: i64) -> Self {
        Self {
            k: Some(k),
            n: None,
        }
    }

    /// Left-biased union: bindings in `self` win.
    #[must_use]
    pub fn merged_over(&self, fallback: &Self) -> Self {
        Self {
            k: self.k.or(fallback.k),
            n: self.n.or(fallback.n),
        }
    }
}

/// Numeric argument of a declared tag: a literal or a parameter name to be
/// substituted at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arg {
    Lit(i64),
    Param(ParamName),
}

impl Arg {
    fn value(self, params: &Params) -> Result<i64, TypeError> {
        match self {
            Self::Lit(value) => Ok(value),
            Self::Param(name) => params
                .get(name)
                .ok_or(TypeError::MissingParam { name }),
        }
    }
}

/// Declared refinement tags. The last three are output-only and lowered by
/// [`resolve_output`]; they are rejected in input or parameter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TyTag {
    NonNegative,
    Positive,
    Negative,
    Even,
    Odd,
    Sorted,
    Divisor(Arg),
    Multiple(Arg),
    Between(Arg, Arg),
    LengthExact(Arg),
    LengthAtLeast(Arg),
    SameLength,
    NoSmaller,
    Element,
}

impl TyTag {
    #[must_use]
    pub fn is_output_only(self) -> bool {
        matches!(self, Self::SameLength | Self::NoSmaller | Self::Element)
    }

    fn label(self) -> &'static str {
        match self {
            Self::NonNegative => "non-negative",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Sorted => "sorted",
            Self::Divisor(_) => "divisor",
            Self::Multiple(_) => "multiple",
            Self::Between(..) => "between",
            Self::LengthExact(_) => "length-exact",
            Self::LengthAtLeast(_) => "length-at-least",
            Self::SameLength => "same-length",
            Self::NoSmaller => "no-smaller",
            Self::Element => "element",
        }
    }
}

/// A declared type: base plus tags, possibly parametric in `k`/`n`. Tag
/// slices live in the static descriptor tables, so no deserializer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TyExpr {
    pub base: Base,
    pub tags: &'static [TyTag],
}

impl TyExpr {
    pub const INT: Self = Self::new(Base::Int, &[]);
    pub const INT_LIST: Self = Self::new(Base::IntList, &[]);

    #[must_use]
    pub const fn new(base: Base, tags: &'static [TyTag]) -> Self {
        Self { base, tags }
    }

    /// Lower a declared input or parameter type into closed form under the
    /// given static parameters. Output-only tags are a declaration error
    /// here.
    pub fn resolve(&self, params: &Params) -> Result<Ty, TypeError> {
        let mut ty = Ty::with_base(self.base);
        for tag in self.tags {
            if tag.is_output_only() {
                return Err(TypeError::OutputOnly { tag: tag.label() });
            }
            apply_tag(&mut ty, *tag, params)?;
        }
        if !ty.is_satisfiable() {
            return Err(TypeError::Unsatisfiable);
        }
        Ok(ty)
    }
}

/// Lower a declared output type, resolving output-only tags against the
/// node's (already resolved) input type and its static parameters.
pub fn resolve_output(
    declared: &TyExpr,
    input: &Ty,
    params: &Params,
) -> Result<Ty, TypeError> {
    let mut ty = Ty::with_base(declared.base);
    for tag in declared.tags {
        match tag {
            TyTag::SameLength => {
                let lowered = match input.length {
                    Length::Exact(n) => Length::Exact(n),
                    other => normalize_length(Length::AtLeast(other.lower_bound())),
                };
                ty.length = meet_length(ty.length, lowered).ok_or(TypeError::Unsatisfiable)?;
            }
            TyTag::NoSmaller => {
                let lowered = normalize_length(Length::AtLeast(input.length.lower_bound()));
                ty.length = meet_length(ty.length, lowered).ok_or(TypeError::Unsatisfiable)?;
            }
            TyTag::Element => {
                // Propagate the integer refinements the input imposes on its
                // elements; divisor bounds do not transfer.
                ty.sign = meet_sign(ty.sign, input.sign).ok_or(TypeError::Unsatisfiable)?;
                ty.parity =
                    meet_parity(ty.parity, input.parity).ok_or(TypeError::Unsatisfiable)?;
                ty.multiple_of = meet_multiple(ty.multiple_of, input.multiple_of)
                    .ok_or(TypeError::Unsatisfiable)?;
                ty.range =
                    meet_range(ty.range, input.range).ok_or(TypeError::Unsatisfiable)?;
            }
            tag => apply_tag(&mut ty, *tag, params)?,
        }
    }
    if !ty.is_satisfiable() {
        return Err(TypeError::Unsatisfiable);
    }
    Ok(ty)
}

fn apply_tag(ty: &mut Ty, tag: TyTag, params: &Params) -> Result<(), TypeError> {
    match tag {
        TyTag::NonNegative => {
            ty.sign =
                meet_sign(ty.sign, Some(Sign::NonNegative)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::Positive => {
            ty.sign = meet_sign(ty.sign, Some(Sign::Positive)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::Negative => {
            ty.sign = meet_sign(ty.sign, Some(Sign::Negative)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::Even => {
            ty.parity =
                meet_parity(ty.parity, Some(Parity::Even)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::Odd => {
            ty.parity =
                meet_parity(ty.parity, Some(Parity::Odd)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::Sorted => ty.sorted = true,
        TyTag::Divisor(arg) => {
            let value = arg.value(params)?;
            if value <= 0 {
                return Err(TypeError::BadModulus { value });
            }
            ty.divisor_of = meet_divisor(ty.divisor_of, Some(value));
        }
        TyTag::Multiple(arg) => {
            let value = arg.value(params)?;
            if value <= 0 {
                return Err(TypeError::BadModulus { value });
            }
            ty.multiple_of =
                meet_multiple(ty.multiple_of, Some(value)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::Between(lo, hi) => {
            let bounds = (lo.value(params)?, hi.value(params)?);
            ty.range = meet_range(ty.range, Some(bounds)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::LengthExact(arg) => {
            let value = arg.value(params)?;
            let n = usize::try_from(value).map_err(|_| TypeError::BadLength { value })?;
            ty.length =
                meet_length(ty.length, Length::Exact(n)).ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::LengthAtLeast(arg) => {
            let value = arg.value(params)?;
            let n = usize::try_from(value).map_err(|_| TypeError::BadLength { value })?;
            ty.length = meet_length(ty.length, normalize_length(Length::AtLeast(n)))
                .ok_or(TypeError::Unsatisfiable)?;
        }
        TyTag::SameLength | TyTag::NoSmaller | TyTag::Element => {
            return Err(TypeError::OutputOnly { tag: tag.label() });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    MissingParam { name: ParamName },
    OutputOnly { tag: &'static str },
    BadModulus { value: i64 },
    BadLength { value: i64 },
    Unsatisfiable,
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParam { name } => {
                write!(f, "type references parameter `{}` with no static binding", name.as_str())
            }
            Self::OutputOnly { tag } => {
                write!(f, "output-only tag `{}` in input position", tag)
            }
            Self::BadModulus { value } => {
                write!(f, "modulus argument must be positive, got {}", value)
            }
            Self::BadLength { value } => {
                write!(f, "length argument must be non-negative, got {}", value)
            }
            Self::Unsatisfiable => write!(f, "contradictory refinements"),
        }
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::{
        Arg, Base, Length, ParamName, Params, Parity, Sign, Ty, TyExpr, TyTag, TypeError,
        resolve_output,
    };
    use crate::Value;
    use proptest::prelude::*;

    fn positive_int() -> Ty {
        TyExpr::new(Base::Int, &[TyTag::Positive])
            .resolve(&Params::default())
            .expect("resolve positive int")
    }

    fn list_at_least(n: usize) -> Ty {
        let mut ty = Ty::int_list();
        ty.length = Length::AtLeast(n);
        ty
    }

    #[test]
    fn intersect_with_any_is_identity() {
        let ty = positive_int();
        assert_eq!(ty.intersect(&Ty::any()), Some(ty));
        assert_eq!(Ty::any().intersect(&ty), Some(ty));
    }

    #[test]
    fn base_clash_is_bottom() {
        assert_eq!(Ty::int().intersect(&Ty::int_list()), None);
    }

    #[test]
    fn sign_contradiction_is_bottom() {
        let negative = TyExpr::new(Base::Int, &[TyTag::Negative])
            .resolve(&Params::default())
            .expect("resolve");
        assert_eq!(positive_int().intersect(&negative), None);
    }

    #[test]
    fn positive_meets_non_negative() {
        let non_negative = TyExpr::new(Base::Int, &[TyTag::NonNegative])
            .resolve(&Params::default())
            .expect("resolve");
        let met = positive_int().intersect(&non_negative).expect("compatible");
        assert_eq!(met.sign, Some(Sign::Positive));
    }

    #[test]
    fn length_exact_clash_is_bottom() {
        let three = TyExpr::new(Base::IntList, &[TyTag::LengthExact(Arg::Lit(3))])
            .resolve(&Params::default())
            .expect("resolve");
        let four = TyExpr::new(Base::IntList, &[TyTag::LengthExact(Arg::Lit(4))])
            .resolve(&Params::default())
            .expect("resolve");
        assert_eq!(three.intersect(&four), None);
    }

    #[test]
    fn multiples_meet_at_lcm() {
        let four = TyExpr::new(Base::Int, &[TyTag::Multiple(Arg::Lit(4))])
            .resolve(&Params::default())
            .expect("resolve");
        let six = TyExpr::new(Base::Int, &[TyTag::Multiple(Arg::Lit(6))])
            .resolve(&Params::default())
            .expect("resolve");
        let met = four.intersect(&six).expect("compatible");
        assert_eq!(met.multiple_of, Some(12));
    }

    #[test]
    fn empty_range_is_bottom() {
        let low = TyExpr::new(Base::Int, &[TyTag::Between(Arg::Lit(0), Arg::Lit(3))])
            .resolve(&Params::default())
            .expect("resolve");
        let high = TyExpr::new(Base::Int, &[TyTag::Between(Arg::Lit(5), Arg::Lit(9))])
            .resolve(&Params::default())
            .expect("resolve");
        assert_eq!(low.intersect(&high), None);
    }

    #[test]
    fn sign_empties_range() {
        let below_zero = TyExpr::new(
            Base::Int,
            &[TyTag::Positive, TyTag::Between(Arg::Lit(-5), Arg::Lit(0))],
        );
        assert_eq!(
            below_zero.resolve(&Params::default()),
            Err(TypeError::Unsatisfiable)
        );
    }

    #[test]
    fn subtype_numeric_containment() {
        assert!(list_at_least(5).subtype(&list_at_least(3)));
        assert!(!list_at_least(3).subtype(&list_at_least(5)));

        let narrow = TyExpr::new(Base::Int, &[TyTag::Between(Arg::Lit(1), Arg::Lit(5))])
            .resolve(&Params::default())
            .expect("resolve");
        let wide = TyExpr::new(Base::Int, &[TyTag::Between(Arg::Lit(0), Arg::Lit(10))])
            .resolve(&Params::default())
            .expect("resolve");
        assert!(narrow.subtype(&wide));
        assert!(!wide.subtype(&narrow));
    }

    #[test]
    fn subtype_sign_widening() {
        let non_negative = TyExpr::new(Base::Int, &[TyTag::NonNegative])
            .resolve(&Params::default())
            .expect("resolve");
        assert!(positive_int().subtype(&non_negative));
        assert!(!non_negative.subtype(&positive_int()));
    }

    #[test]
    fn subtype_sign_from_range() {
        let narrow = TyExpr::new(Base::Int, &[TyTag::Between(Arg::Lit(1), Arg::Lit(5))])
            .resolve(&Params::default())
            .expect("resolve");
        assert!(narrow.subtype(&positive_int()));
    }

    #[test]
    fn everything_is_a_subtype_of_any() {
        assert!(positive_int().subtype(&Ty::any()));
        assert!(list_at_least(2).subtype(&Ty::any()));
        assert!(Ty::any().subtype(&Ty::any()));
    }

    #[test]
    fn admits_respects_base() {
        assert!(Ty::int().admits(&Value::Int(-4)));
        assert!(!Ty::int().admits(&Value::List(vec![1])));
        assert!(Ty::int_list().admits(&Value::List(vec![])));
        assert!(!Ty::int_list().admits(&Value::Int(0)));
        assert!(Ty::any().admits(&Value::Int(9)));
        assert!(Ty::any().admits(&Value::List(vec![9])));
    }

    #[test]
    fn admits_elementwise_refinements() {
        let ty = TyExpr::new(Base::IntList, &[TyTag::Positive, TyTag::Even])
            .resolve(&Params::default())
            .expect("resolve");
        assert!(ty.admits(&Value::List(vec![2, 4, 6])));
        assert!(!ty.admits(&Value::List(vec![2, 3])));
        assert!(!ty.admits(&Value::List(vec![0, 2])));
    }

    #[test]
    fn admits_sorted_and_length() {
        let ty = TyExpr::new(
            Base::IntList,
            &[TyTag::Sorted, TyTag::LengthAtLeast(Arg::Lit(2))],
        )
        .resolve(&Params::default())
        .expect("resolve");
        assert!(ty.admits(&Value::List(vec![1, 1, 3])));
        assert!(!ty.admits(&Value::List(vec![3, 1])));
        assert!(!ty.admits(&Value::List(vec![5])));
    }

    #[test]
    fn admits_divisor() {
        let ty = TyExpr::new(Base::Int, &[TyTag::Divisor(Arg::Lit(12))])
            .resolve(&Params::default())
            .expect("resolve");
        assert!(ty.admits(&Value::Int(4)));
        assert!(ty.admits(&Value::Int(-6)));
        assert!(!ty.admits(&Value::Int(5)));
        assert!(!ty.admits(&Value::Int(0)));
    }

    #[test]
    fn resolve_substitutes_params() {
        let expr = TyExpr::new(Base::IntList, &[TyTag::LengthAtLeast(Arg::Param(ParamName::K))]);
        let ty = expr.resolve(&Params::with_k(3)).expect("resolve");
        assert_eq!(ty.length, Length::AtLeast(3));

        assert_eq!(
            expr.resolve(&Params::default()),
            Err(TypeError::MissingParam { name: ParamName::K })
        );
    }

    #[test]
    fn resolve_rejects_output_only_tags() {
        let expr = TyExpr::new(Base::IntList, &[TyTag::SameLength]);
        assert_eq!(
            expr.resolve(&Params::default()),
            Err(TypeError::OutputOnly { tag: "same-length" })
        );
    }

    #[test]
    fn same_length_lowers_to_exact_when_known() {
        let declared = TyExpr::new(Base::IntList, &[TyTag::SameLength]);
        let input = TyExpr::new(Base::IntList, &[TyTag::LengthExact(Arg::Lit(4))])
            .resolve(&Params::default())
            .expect("resolve");
        let out = resolve_output(&declared, &input, &Params::default()).expect("lower");
        assert_eq!(out.length, Length::Exact(4));
    }

    #[test]
    fn same_length_lowers_to_bound_otherwise() {
        let declared = TyExpr::new(Base::IntList, &[TyTag::SameLength]);
        let out =
            resolve_output(&declared, &list_at_least(2), &Params::default()).expect("lower");
        assert_eq!(out.length, Length::AtLeast(2));
    }

    #[test]
    fn no_smaller_lowers_to_input_bound() {
        let declared = TyExpr::new(Base::IntList, &[TyTag::NoSmaller]);
        let input = TyExpr::new(Base::IntList, &[TyTag::LengthExact(Arg::Lit(3))])
            .resolve(&Params::default())
            .expect("resolve");
        let out = resolve_output(&declared, &input, &Params::default()).expect("lower");
        assert_eq!(out.length, Length::AtLeast(3));
    }

    #[test]
    fn element_propagates_integer_refinements() {
        let declared = TyExpr::new(Base::Int, &[TyTag::Element]);
        let input = TyExpr::new(
            Base::IntList,
            &[TyTag::Positive, TyTag::Even, TyTag::LengthAtLeast(Arg::Lit(1))],
        )
        .resolve(&Params::default())
        .expect("resolve");
        let out = resolve_output(&declared, &input, &Params::default()).expect("lower");
        assert_eq!(out.base, Base::Int);
        assert_eq!(out.sign, Some(Sign::Positive));
        assert_eq!(out.parity, Some(Parity::Even));
        assert_eq!(out.length, Length::Free);
    }

    #[test]
    fn meet_into_discards_any() {
        let ty = positive_int();
        assert_eq!(Ty::meet_into(&Ty::any(), &ty), Some(ty));
        let merged = Ty::meet_into(&ty, &Ty::int()).expect("compatible");
        assert_eq!(merged, ty);
    }

    // ── Lattice algebra ────────────────────────────────────────────

    fn arb_ty() -> impl Strategy<Value = Ty> {
        let base = prop_oneof![Just(Base::Any), Just(Base::Int), Just(Base::IntList)];
        let sign = proptest::option::of(prop_oneof![
            Just(Sign::NonNegative),
            Just(Sign::Positive),
            Just(Sign::Negative),
        ]);
        let parity = proptest::option::of(prop_oneof![Just(Parity::Even), Just(Parity::Odd)]);
        let divisor = proptest::option::of(1_i64..=24);
        let multiple = proptest::option::of(1_i64..=12);
        let range = proptest::option::of((-8_i64..=8).prop_flat_map(|lo| {
            (Just(lo), lo..=8).prop_map(|(lo, hi)| (lo, hi))
        }));
        let length = prop_oneof![
            Just(Length::Free),
            (1_usize..=6).prop_map(Length::AtLeast),
            (0_usize..=6).prop_map(Length::Exact),
        ];
        (base, sign, parity, divisor, multiple, range, length, any::<bool>())
            .prop_map(
                |(base, sign, parity, divisor_of, multiple_of, range, length, sorted)| Ty {
                    base,
                    sign,
                    parity,
                    divisor_of,
                    multiple_of,
                    range,
                    length,
                    sorted,
                },
            )
            .prop_filter("satisfiable", |ty| ty.intersect(ty).is_some())
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-30_i64..=30).prop_map(Value::Int),
            proptest::collection::vec(-30_i64..=30, 0..6).prop_map(Value::List),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: lr_test_utils_case_count(),
            ..ProptestConfig::default()
        })]

        #[test]
        fn intersect_is_commutative(a in arb_ty(), b in arb_ty()) {
            prop_assert_eq!(a.intersect(&b), b.intersect(&a));
        }

        #[test]
        fn intersect_is_idempotent(a in arb_ty()) {
            prop_assert_eq!(a.intersect(&a), Some(a));
        }

        #[test]
        fn intersect_is_associative(a in arb_ty(), b in arb_ty(), c in arb_ty()) {
            let left = a.intersect(&b).and_then(|ab| ab.intersect(&c));
            let right = b.intersect(&c).and_then(|bc| a.intersect(&bc));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn subtype_is_reflexive(a in arb_ty()) {
            prop_assert!(a.subtype(&a));
        }

        #[test]
        fn subtype_implies_admission(a in arb_ty(), b in arb_ty(), v in arb_value()) {
            if a.subtype(&b) && a.admits(&v) {
                prop_assert!(b.admits(&v));
            }
        }

        #[test]
        fn intersection_admits_exactly_both(a in arb_ty(), b in arb_ty(), v in arb_value()) {
            if let Some(met) = a.intersect(&b) {
                if met.admits(&v) {
                    prop_assert!(a.admits(&v) && b.admits(&v));
                }
            }
        }
    }

    fn lr_test_utils_case_count() -> u32 {
        // Mirrors lr-test-utils::property_test_case_count without a
        // dev-dependency cycle back into this crate.
        std::env::var("LR_PROPTEST_CASES")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .filter(|cases| *cases > 0)
            .unwrap_or(256)
    }
}
