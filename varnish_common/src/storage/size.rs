//! Size quantities (`10%`, `5.5g`, `8192`) validated against a byte capacity.
//!
//! A [`SizeSpec`] keeps the parsed magnitude as an exact decimal, so the byte
//! value is an exact rational number. Rendering picks the largest unit that
//! represents the value exactly, and only rounds (half-up, one unit further
//! down) when no exact representation exists at that scale.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::error::{StorageResult, StorageSpecError};

/// Leading `<decimal><unit>` portion of a size token. Trailing text is ignored.
static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?P<int>[0-9]+)(?:\.(?P<frac>[0-9]+))?(?P<unit>[bkmgtp%])?")
        .expect("size pattern is valid")
});

/// Fraction digits kept from a size token. Later digits are truncated.
const MAX_FRACTION_DIGITS: usize = 18;

// ─── SizeUnit ───────────────────────────────────────────────────────

/// Unit suffix of a size token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeUnit {
    /// No suffix or `b`.
    Bytes,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
    /// Percentage of the capacity.
    Percent,
}

impl SizeUnit {
    /// Units considered when rendering, largest first.
    const RENDER_ORDER: [SizeUnit; 5] = [
        SizeUnit::Peta,
        SizeUnit::Tera,
        SizeUnit::Giga,
        SizeUnit::Mega,
        SizeUnit::Kilo,
    ];

    /// Bytes per unit (`1024^n`). `None` for [`SizeUnit::Percent`].
    pub const fn multiplier(self) -> Option<u64> {
        match self {
            Self::Bytes => Some(1),
            Self::Kilo => Some(1 << 10),
            Self::Mega => Some(1 << 20),
            Self::Giga => Some(1 << 30),
            Self::Tera => Some(1 << 40),
            Self::Peta => Some(1 << 50),
            Self::Percent => None,
        }
    }

    /// Canonical (lowercase) suffix. Bytes render without a suffix.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Bytes => "",
            Self::Kilo => "k",
            Self::Mega => "m",
            Self::Giga => "g",
            Self::Tera => "t",
            Self::Peta => "p",
            Self::Percent => "%",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "" | "b" => Some(Self::Bytes),
            "k" => Some(Self::Kilo),
            "m" => Some(Self::Mega),
            "g" => Some(Self::Giga),
            "t" => Some(Self::Tera),
            "p" => Some(Self::Peta),
            "%" => Some(Self::Percent),
            _ => None,
        }
    }
}

// ─── Magnitude ──────────────────────────────────────────────────────

/// Exact non-negative decimal number: `digits / 10^scale`.
///
/// Trailing fractional zeros are dropped on parse, so `scale == 0` exactly
/// when the value is integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magnitude {
    digits: u128,
    scale: u32,
}

impl Magnitude {
    /// `None` if the digits do not fit a `u128`.
    fn from_parts(int: &str, frac: &str) -> Option<Self> {
        let frac = frac
            .get(..MAX_FRACTION_DIGITS)
            .unwrap_or(frac)
            .trim_end_matches('0');
        let digits = format!("{int}{frac}").parse::<u128>().ok()?;
        Some(Self {
            digits,
            scale: frac.len() as u32,
        })
    }

    /// Whether the value has no fractional part.
    pub fn is_integral(&self) -> bool {
        self.scale == 0
    }

    fn denominator(&self) -> u128 {
        10u128.pow(self.scale)
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integral() {
            return write!(f, "{}", self.digits);
        }
        let den = self.denominator();
        write!(
            f,
            "{}.{:0width$}",
            self.digits / den,
            self.digits % den,
            width = self.scale as usize
        )
    }
}

// ─── ExactBytes ─────────────────────────────────────────────────────

/// Byte quantity `whole + frac / denom`, with `frac < denom <= 10^20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExactBytes {
    whole: u128,
    frac: u128,
    denom: u128,
}

impl ExactBytes {
    /// `None` if the whole part overflows `u128`, which is beyond any capacity.
    fn of(magnitude: Magnitude, unit: SizeUnit, capacity: u64) -> Option<Self> {
        let (factor, denom) = match unit.multiplier() {
            Some(multiplier) => (multiplier, magnitude.denominator()),
            None => (capacity, magnitude.denominator() * 100),
        };
        let (int, rem) = (magnitude.digits / denom, magnitude.digits % denom);
        let (carry, frac) = mul_div(rem, factor, denom);
        let whole = int.checked_mul(u128::from(factor))?.checked_add(carry)?;
        Some(Self { whole, frac, denom })
    }

    fn exceeds(&self, capacity: u64) -> bool {
        let capacity = u128::from(capacity);
        self.whole > capacity || (self.whole == capacity && self.frac > 0)
    }

    /// Whole bytes, truncated.
    fn whole(&self) -> u128 {
        self.whole
    }

    /// Quotient at `unit_size` bytes per unit, rounded half-up.
    fn rounded_at(&self, unit_size: u128) -> u128 {
        let (quot, rem) = (self.whole / unit_size, self.whole % unit_size);
        if 2 * (rem * self.denom + self.frac) >= unit_size * self.denom {
            quot + 1
        } else {
            quot
        }
    }

    fn render(&self) -> String {
        let mut round_next = false;
        for unit in SizeUnit::RENDER_ORDER {
            let unit_size = u128::from(unit.multiplier().unwrap_or(1));
            if round_next {
                return format!("{}{}", self.rounded_at(unit_size), unit.suffix());
            }
            if self.whole >= unit_size {
                if self.frac == 0 && self.whole % unit_size == 0 {
                    return format!("{}{}", self.whole / unit_size, unit.suffix());
                }
                round_next = true;
            }
        }
        // A fractional kilo quotient rounds half-up to whole bytes; smaller
        // values are truncated.
        if round_next {
            self.rounded_at(1).to_string()
        } else {
            self.whole.to_string()
        }
    }
}

/// `(a * b / d, a * b % d)` for `a < d <= 10^20`, computed in 32-bit halves of
/// `b` so no intermediate exceeds 2^100.
fn mul_div(a: u128, b: u64, d: u128) -> (u128, u128) {
    let (hi, lo) = (u128::from(b >> 32), u128::from(b & 0xffff_ffff));
    let high = a * hi;
    let shifted = (high % d) << 32;
    let low = shifted % d + a * lo;
    (((high / d) << 32) + shifted / d + low / d, low % d)
}

// ─── SizeSpec ───────────────────────────────────────────────────────

/// A validated size token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    magnitude: Magnitude,
    unit: SizeUnit,
    capacity: u64,
    bytes: ExactBytes,
}

impl SizeSpec {
    /// Parse `spec` and validate it against `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns `StorageSpecError::InvalidStorageSize` if:
    /// - the leading portion of `spec` is not `<decimal><unit>?`
    /// - a percentage exceeds 100
    /// - the byte value exceeds `capacity`
    pub fn parse(spec: &str, capacity: u64) -> StorageResult<Self> {
        let invalid = || StorageSpecError::invalid_size(format!("Not a valid size string: {spec}"));

        let caps = SIZE_PATTERN.captures(spec).ok_or_else(invalid)?;
        let int = caps.name("int").map_or("", |m| m.as_str());
        let frac = caps.name("frac").map_or("", |m| m.as_str());
        let suffix = caps.name("unit").map_or("", |m| m.as_str());

        let unit = SizeUnit::from_suffix(suffix).ok_or_else(invalid)?;
        let number = if frac.is_empty() {
            int.to_string()
        } else {
            format!("{int}.{frac}")
        };
        let over_percent = |shown: &dyn fmt::Display| {
            StorageSpecError::invalid_size(format!(
                "size can't exceed capacity ({shown}% > 100%)"
            ))
        };
        let over_capacity = |shown: &dyn fmt::Display| {
            StorageSpecError::invalid_size(format!(
                "size can't exceed capacity ({shown} > {capacity})"
            ))
        };

        let Some(magnitude) = Magnitude::from_parts(int, frac) else {
            return Err(match unit {
                SizeUnit::Percent => over_percent(&number),
                _ => over_capacity(&format_args!("{number}{}", unit.suffix())),
            });
        };

        if unit == SizeUnit::Percent && magnitude.digits > 100 * magnitude.denominator() {
            return Err(over_percent(&magnitude));
        }

        let bytes = ExactBytes::of(magnitude, unit, capacity)
            .ok_or_else(|| over_capacity(&format_args!("{number}{}", unit.suffix())))?;
        if bytes.exceeds(capacity) {
            return Err(over_capacity(&bytes.whole()));
        }

        Ok(Self {
            magnitude,
            unit,
            capacity,
            bytes,
        })
    }

    /// Parsed magnitude, before unit conversion.
    pub fn magnitude(&self) -> Magnitude {
        self.magnitude
    }

    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    /// Capacity this size was validated against.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Byte value, truncated to whole bytes. Never exceeds [`capacity`](Self::capacity).
    pub fn bytes(&self) -> u64 {
        u64::try_from(self.bytes.whole()).unwrap_or(self.capacity)
    }

    /// Canonical rendering, e.g. `1638m`, `8k` or `1000`.
    pub fn normalized(&self) -> String {
        self.bytes.render()
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// Parses against a capacity of `u64::MAX` bytes, so only percentages over
/// 100 are rejected.
impl FromStr for SizeSpec {
    type Err = StorageSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * MB;

    fn render(spec: &str, capacity: u64) -> String {
        SizeSpec::parse(spec, capacity).unwrap().normalized()
    }

    #[test]
    fn test_exact_values_keep_their_unit() {
        assert_eq!(render("10g", 100 * GB), "10g");
        assert_eq!(render("8192", GB), "8k");
        assert_eq!(render("1024m", 100 * GB), "1g");
        assert_eq!(render("2t", u64::MAX), "2t");
        assert_eq!(render("3p", u64::MAX), "3p");
    }

    #[test]
    fn test_fractional_value_rounds_one_unit_down() {
        assert_eq!(render("5.5g", 10 * GB), "5632m");
        assert_eq!(render("1.5k", GB), "1536");
        // 1.0001g is 1024.1024m, rounded to 1024m; exactness is only tried
        // at the first unit whose quotient reaches one.
        assert_eq!(render("1.0001g", 10 * GB), "1024m");
    }

    #[test]
    fn test_rounding_is_half_up() {
        // 0.25% of 1 MiB = 2621.44 bytes
        assert_eq!(render("0.25%", MB), "2621");
        // 1573376 bytes = 1536.5k
        assert_eq!(render("1573376", GB), "1537k");
        // 1572352 bytes = 1535.5k
        assert_eq!(render("1572352", GB), "1536k");
    }

    #[test]
    fn test_fractional_kilo_rounds_to_bytes() {
        // 1.5005k = 1536.512 bytes; rounded, not truncated to 1536.
        assert_eq!(render("1.5005k", GB), "1537");
        assert_eq!(render("1.5004k", GB), "1536");
        // 1.0004k = 1024.4096 bytes
        assert_eq!(render("1.0004k", GB), "1024");
    }

    #[test]
    fn test_wide_decimals_are_accepted() {
        const TB: u64 = 1 << 40;

        let size = SizeSpec::parse("50.000000000000000001%", TB).unwrap();
        assert_eq!(size.bytes(), TB / 2);
        assert_eq!(size.normalized(), "524288m");

        let size = SizeSpec::parse("99.999999999999999999%", TB).unwrap();
        assert_eq!(size.bytes(), TB - 1);
        assert_eq!(size.normalized(), "1048576m");

        assert_eq!(render("20000000000.5", u64::MAX), "19073m");
        assert_eq!(render("1.0000000000000000000001g", 10 * GB), "1g");
        assert_eq!(render("100.00000000000000000001%", GB), "1g");
    }

    #[test]
    fn test_huge_numbers_exceed_capacity() {
        let huge = format!("1{}", "0".repeat(40));
        for (spec, reason) in [
            (format!("{huge}g"), format!("size can't exceed capacity ({huge}g > {GB})")),
            (format!("{huge}%"), format!("size can't exceed capacity ({huge}% > 100%)")),
            (
                format!("{}p", u128::MAX),
                format!("size can't exceed capacity ({}p > {GB})", u128::MAX),
            ),
            (
                format!("{}.5", u64::MAX),
                format!("size can't exceed capacity ({} > {GB})", u64::MAX),
            ),
        ] {
            assert_eq!(
                SizeSpec::parse(&spec, GB).unwrap_err(),
                StorageSpecError::InvalidStorageSize { reason },
                "{spec}"
            );
        }
    }

    #[test]
    fn test_percent_of_capacity() {
        assert_eq!(render("10%", 100 * 1024 * MB), "10g");
        assert_eq!(render("10%", 16 * 1024 * MB), "1638m");
        assert_eq!(render("25.55%", 16 * 1024 * MB), "4186m");
        assert_eq!(render("100%", 8 * GB), "8g");
    }

    #[test]
    fn test_small_values_render_as_bytes() {
        assert_eq!(render("0", GB), "0");
        assert_eq!(render("1000", GB), "1000");
        assert_eq!(render("512b", GB), "512");
    }

    #[test]
    fn test_units_are_case_insensitive() {
        assert_eq!(render("20G", 100 * GB), "20g");
        assert_eq!(render("16K", GB), "16k");
        assert_eq!(SizeSpec::parse("1M", GB).unwrap().unit(), SizeUnit::Mega);
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        assert_eq!(render("10gigabytes", 100 * GB), "10g");
    }

    #[test]
    fn test_percent_over_100_rejected() {
        let err = SizeSpec::parse("101%", u64::MAX).unwrap_err();
        assert_eq!(
            err,
            StorageSpecError::InvalidStorageSize {
                reason: "size can't exceed capacity (101% > 100%)".to_string()
            }
        );
        assert!(SizeSpec::parse("100.5%", u64::MAX).is_err());
        assert!(SizeSpec::parse("100.0%", GB).is_ok());
    }

    #[test]
    fn test_over_capacity_rejected() {
        let err = SizeSpec::parse("16385m", 16384 * MB).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("size can't exceed capacity ({} > {})", 16385 * MB, 16384 * MB)
        );
        assert!(SizeSpec::parse("16384m", 16384 * MB).is_ok());
    }

    #[test]
    fn test_malformed_rejected() {
        for spec in ["badsize", "", "g10", ".5g", "-1g"] {
            let err = SizeSpec::parse(spec, u64::MAX).unwrap_err();
            assert_eq!(err.to_string(), format!("Not a valid size string: {spec}"));
        }
    }

    #[test]
    fn test_magnitude_tracks_integrality() {
        let size = SizeSpec::parse("25.550%", GB).unwrap();
        assert!(!size.magnitude().is_integral());
        assert_eq!(size.magnitude().to_string(), "25.55");

        let size = SizeSpec::parse("10.00g", 100 * GB).unwrap();
        assert!(size.magnitude().is_integral());
        assert_eq!(size.magnitude().to_string(), "10");
        assert_eq!(size.bytes(), 10 * GB);
    }

    #[test]
    fn test_second_render_is_stable() {
        for (spec, capacity) in [
            ("10%", 16 * 1024 * MB),
            ("25.55%", 16 * 1024 * MB),
            ("5.5g", 10 * GB),
            ("1.99999g", 10 * GB),
            ("0.3%", 7 * GB + 3),
        ] {
            let first = render(spec, capacity);
            let second = render(&first, capacity);
            let third = render(&second, capacity);
            assert_eq!(second, third, "{spec} against {capacity}");
        }
    }

    #[test]
    fn test_from_str_is_unbounded() {
        let size: SizeSpec = "4t".parse().unwrap();
        assert_eq!(size.bytes(), 4 * 1024 * GB);
        assert_eq!(size.capacity(), u64::MAX);
    }
}
