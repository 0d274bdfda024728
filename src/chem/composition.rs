//! Chemical formula parsing.
//!
//! Accepts formulas such as `Fe2O3`, `LiFePO4`, `Ca(OH)2`, `K4[Fe(CN)6]`
//! and `Na0.5 Cl0.5`. Repeated elements accumulate; bracket groups multiply
//! their contents by a trailing amount.

use crate::chem::elements::Element;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a formula string can be rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    #[error("empty formula")]
    Empty,
    #[error("unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("formula has no atoms")]
    NoAtoms,
    #[error("brackets nested too deeply")]
    TooDeep,
}

/// Deepest bracket nesting the parser accepts.
const MAX_NESTING: usize = 64;

/// A parsed chemical formula: element amounts in first-appearance order.
#[derive(Debug, Clone)]
pub struct Composition {
    amounts: Vec<(Element, f64)>,
}

impl Composition {
    /// Parse a formula, returning `None` for anything malformed.
    ///
    /// This is the lenient entry point used when loading datasets: a bad
    /// substance string degrades to a missing composition instead of
    /// aborting the whole load.
    pub fn parse(formula: &str) -> Option<Self> {
        formula.parse().ok()
    }

    /// Elements present, in first-appearance order.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.amounts.iter().map(|(e, _)| *e)
    }

    /// Amount of `element`, zero if absent.
    pub fn amount(&self, element: Element) -> f64 {
        self.amounts
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, a)| *a)
            .unwrap_or(0.0)
    }

    /// Total number of atoms in the formula unit.
    pub fn num_atoms(&self) -> f64 {
        self.amounts.iter().map(|(_, a)| a).sum()
    }

    /// Atomic fraction of each element.
    pub fn fractions(&self) -> Vec<(Element, f64)> {
        let total = self.num_atoms();
        self.amounts.iter().map(|(e, a)| (*e, a / total)).collect()
    }

    /// True if any constituent element's symbol is in `symbols`.
    pub fn contains_any(&self, symbols: &HashSet<String>) -> bool {
        self.elements().any(|e| symbols.contains(e.symbol()))
    }

    /// Space-separated formula with explicit amounts, e.g. `"Fe2 O3"`.
    pub fn formula(&self) -> String {
        self.amounts
            .iter()
            .map(|(e, a)| format!("{}{}", e.symbol(), format_amount(*a)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl PartialEq for Composition {
    fn eq(&self, other: &Self) -> bool {
        self.amounts.len() == other.amounts.len()
            && self
                .amounts
                .iter()
                .all(|(e, a)| (other.amount(*e) - a).abs() < 1e-8)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula())
    }
}

impl FromStr for Composition {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Err(CompositionError::Empty);
        }

        let mut parser = Parser { chars, pos: 0 };
        let terms = parser.group(None, 0)?;

        let mut amounts: Vec<(Element, f64)> = Vec::new();
        for (element, amount) in terms {
            match amounts.iter_mut().find(|(e, _)| *e == element) {
                Some((_, total)) => *total += amount,
                None => amounts.push((element, amount)),
            }
        }
        amounts.retain(|(_, a)| *a > 0.0);

        if amounts.is_empty() {
            return Err(CompositionError::NoAtoms);
        }
        Ok(Self { amounts })
    }
}

fn format_amount(amount: f64) -> String {
    if (amount - amount.round()).abs() < 1e-8 {
        format!("{}", amount.round())
    } else {
        let text = format!("{:.8}", amount);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// ---------------------------------------------------------------------------
// Recursive-descent parser
// ---------------------------------------------------------------------------

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Parse terms until end of input (top level) or the matching `closer`.
    fn group(
        &mut self,
        closer: Option<char>,
        depth: usize,
    ) -> Result<Vec<(Element, f64)>, CompositionError> {
        let mut terms = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return match closer {
                    Some(_) => Err(CompositionError::UnbalancedBrackets),
                    None => Ok(terms),
                };
            };

            match c {
                '(' | '[' => {
                    if depth >= MAX_NESTING {
                        return Err(CompositionError::TooDeep);
                    }
                    self.pos += 1;
                    let expected = if c == '(' { ')' } else { ']' };
                    let inner = self.group(Some(expected), depth + 1)?;
                    let factor = self.amount()?.unwrap_or(1.0);
                    terms.extend(inner.into_iter().map(|(e, a)| (e, a * factor)));
                }
                ')' | ']' => {
                    if closer != Some(c) {
                        return Err(CompositionError::UnbalancedBrackets);
                    }
                    self.pos += 1;
                    return Ok(terms);
                }
                c if c.is_ascii_uppercase() => {
                    let element = self.element()?;
                    let amount = self.amount()?.unwrap_or(1.0);
                    terms.push((element, amount));
                }
                found => {
                    return Err(CompositionError::UnexpectedChar {
                        found,
                        position: self.pos,
                    })
                }
            }
        }
    }

    fn element(&mut self) -> Result<Element, CompositionError> {
        let start = self.pos;
        self.pos += 1;
        if self.peek().is_some_and(|c| c.is_ascii_lowercase()) {
            self.pos += 1;
        }
        let symbol: String = self.chars[start..self.pos].iter().collect();
        Element::from_symbol(&symbol).ok_or(CompositionError::UnknownElement(symbol))
    }

    fn amount(&mut self) -> Result<Option<f64>, CompositionError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .map(Some)
            .ok_or(CompositionError::InvalidAmount(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(symbol: &str) -> Element {
        Element::from_symbol(symbol).unwrap()
    }

    #[test]
    fn parses_simple_formula() {
        let comp = Composition::parse("Fe2O3").unwrap();
        assert_eq!(comp.amount(el("Fe")), 2.0);
        assert_eq!(comp.amount(el("O")), 3.0);
        assert_eq!(comp.num_atoms(), 5.0);
        assert_eq!(comp.formula(), "Fe2 O3");
    }

    #[test]
    fn implicit_amount_is_one() {
        let comp = Composition::parse("NaCl").unwrap();
        assert_eq!(comp.formula(), "Na1 Cl1");
    }

    #[test]
    fn nested_groups_multiply() {
        let comp = Composition::parse("K4[Fe(CN)6]").unwrap();
        assert_eq!(comp.amount(el("K")), 4.0);
        assert_eq!(comp.amount(el("Fe")), 1.0);
        assert_eq!(comp.amount(el("C")), 6.0);
        assert_eq!(comp.amount(el("N")), 6.0);
    }

    #[test]
    fn repeated_elements_accumulate() {
        let comp = Composition::parse("Ca(OH)2").unwrap();
        assert_eq!(comp.amount(el("O")), 2.0);
        assert_eq!(comp.amount(el("H")), 2.0);

        let comp = Composition::parse("CH3COOH").unwrap();
        assert_eq!(comp.amount(el("C")), 2.0);
        assert_eq!(comp.amount(el("H")), 4.0);
        assert_eq!(comp.amount(el("O")), 2.0);
    }

    #[test]
    fn fractional_amounts_and_whitespace() {
        let comp = Composition::parse(" Li0.5 Co0.25 O2 ").unwrap();
        assert_eq!(comp.amount(el("Li")), 0.5);
        assert_eq!(comp.formula(), "Li0.5 Co0.25 O2");
    }

    #[test]
    fn display_form_round_trips() {
        for formula in ["Fe2O3", "LiFePO4", "Ba(Ti0.9Zr0.1)O3", "Mg(OH)2"] {
            let comp = Composition::parse(formula).unwrap();
            let again = Composition::parse(&comp.formula()).unwrap();
            assert_eq!(comp, again, "{formula}");
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<Composition>(), Err(CompositionError::Empty));
        assert_eq!(
            "Xy2".parse::<Composition>(),
            Err(CompositionError::UnknownElement("Xy".into()))
        );
        assert_eq!(
            "Ca(OH2".parse::<Composition>(),
            Err(CompositionError::UnbalancedBrackets)
        );
        assert_eq!(
            "Ca(OH]2".parse::<Composition>(),
            Err(CompositionError::UnbalancedBrackets)
        );
        assert!(matches!(
            "Fe-O".parse::<Composition>(),
            Err(CompositionError::UnexpectedChar { found: '-', .. })
        ));
        assert_eq!(
            "Fe1.2.3".parse::<Composition>(),
            Err(CompositionError::InvalidAmount("1.2.3".into()))
        );
        assert_eq!("Fe0".parse::<Composition>(), Err(CompositionError::NoAtoms));
        assert!(Composition::parse("iron oxide").is_none());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let ok = format!("{}Fe{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(Composition::parse(&ok).is_some());

        let deep = format!("{}Fe{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(deep.parse::<Composition>(), Err(CompositionError::TooDeep));
        assert!(Composition::parse(&deep).is_none());
    }

    #[test]
    fn huge_integer_amounts_round_trip() {
        let comp = Composition::parse("Fe100000000000000000000O").unwrap();
        assert_eq!(comp.formula(), "Fe100000000000000000000 O1");
        assert_eq!(Composition::parse(&comp.formula()).unwrap(), comp);
    }

    #[test]
    fn contains_any_uses_or_semantics() {
        let comp = Composition::parse("FeNi").unwrap();
        let wanted: HashSet<String> = ["Fe".to_string(), "Co".to_string()].into();
        assert!(comp.contains_any(&wanted));

        let none: HashSet<String> = ["Cu".to_string()].into();
        assert!(!comp.contains_any(&none));
    }
}
