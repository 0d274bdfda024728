//! Periodic table data used by the composition parser and featurizer.
//!
//! Covers hydrogen through lawrencium. Lanthanides and actinides are placed
//! in column 3, matching the Magpie element tables.

use std::fmt;

/// Static per-element properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub number: u8,
    pub symbol: &'static str,
    pub atomic_weight: f64,
    pub row: u8,
    pub column: u8,
    /// Pauling electronegativity; `None` for the lighter noble gases.
    pub electronegativity: Option<f64>,
}

const fn el(
    number: u8,
    symbol: &'static str,
    atomic_weight: f64,
    row: u8,
    column: u8,
    electronegativity: Option<f64>,
) -> ElementData {
    ElementData {
        number,
        symbol,
        atomic_weight,
        row,
        column,
        electronegativity,
    }
}

/// Elements indexed by `atomic number - 1`.
pub const ELEMENTS: [ElementData; 103] = [
    el(1, "H", 1.008, 1, 1, Some(2.20)),
    el(2, "He", 4.0026, 1, 18, None),
    el(3, "Li", 6.94, 2, 1, Some(0.98)),
    el(4, "Be", 9.0122, 2, 2, Some(1.57)),
    el(5, "B", 10.81, 2, 13, Some(2.04)),
    el(6, "C", 12.011, 2, 14, Some(2.55)),
    el(7, "N", 14.007, 2, 15, Some(3.04)),
    el(8, "O", 15.999, 2, 16, Some(3.44)),
    el(9, "F", 18.998, 2, 17, Some(3.98)),
    el(10, "Ne", 20.180, 2, 18, None),
    el(11, "Na", 22.990, 3, 1, Some(0.93)),
    el(12, "Mg", 24.305, 3, 2, Some(1.31)),
    el(13, "Al", 26.982, 3, 13, Some(1.61)),
    el(14, "Si", 28.085, 3, 14, Some(1.90)),
    el(15, "P", 30.974, 3, 15, Some(2.19)),
    el(16, "S", 32.06, 3, 16, Some(2.58)),
    el(17, "Cl", 35.45, 3, 17, Some(3.16)),
    el(18, "Ar", 39.948, 3, 18, None),
    el(19, "K", 39.098, 4, 1, Some(0.82)),
    el(20, "Ca", 40.078, 4, 2, Some(1.00)),
    el(21, "Sc", 44.956, 4, 3, Some(1.36)),
    el(22, "Ti", 47.867, 4, 4, Some(1.54)),
    el(23, "V", 50.942, 4, 5, Some(1.63)),
    el(24, "Cr", 51.996, 4, 6, Some(1.66)),
    el(25, "Mn", 54.938, 4, 7, Some(1.55)),
    el(26, "Fe", 55.845, 4, 8, Some(1.83)),
    el(27, "Co", 58.933, 4, 9, Some(1.88)),
    el(28, "Ni", 58.693, 4, 10, Some(1.91)),
    el(29, "Cu", 63.546, 4, 11, Some(1.90)),
    el(30, "Zn", 65.38, 4, 12, Some(1.65)),
    el(31, "Ga", 69.723, 4, 13, Some(1.81)),
    el(32, "Ge", 72.630, 4, 14, Some(2.01)),
    el(33, "As", 74.922, 4, 15, Some(2.18)),
    el(34, "Se", 78.971, 4, 16, Some(2.55)),
    el(35, "Br", 79.904, 4, 17, Some(2.96)),
    el(36, "Kr", 83.798, 4, 18, Some(3.00)),
    el(37, "Rb", 85.468, 5, 1, Some(0.82)),
    el(38, "Sr", 87.62, 5, 2, Some(0.95)),
    el(39, "Y", 88.906, 5, 3, Some(1.22)),
    el(40, "Zr", 91.224, 5, 4, Some(1.33)),
    el(41, "Nb", 92.906, 5, 5, Some(1.6)),
    el(42, "Mo", 95.95, 5, 6, Some(2.16)),
    el(43, "Tc", 98.0, 5, 7, Some(1.9)),
    el(44, "Ru", 101.07, 5, 8, Some(2.2)),
    el(45, "Rh", 102.91, 5, 9, Some(2.28)),
    el(46, "Pd", 106.42, 5, 10, Some(2.20)),
    el(47, "Ag", 107.87, 5, 11, Some(1.93)),
    el(48, "Cd", 112.41, 5, 12, Some(1.69)),
    el(49, "In", 114.82, 5, 13, Some(1.78)),
    el(50, "Sn", 118.71, 5, 14, Some(1.96)),
    el(51, "Sb", 121.76, 5, 15, Some(2.05)),
    el(52, "Te", 127.60, 5, 16, Some(2.1)),
    el(53, "I", 126.90, 5, 17, Some(2.66)),
    el(54, "Xe", 131.29, 5, 18, Some(2.6)),
    el(55, "Cs", 132.91, 6, 1, Some(0.79)),
    el(56, "Ba", 137.33, 6, 2, Some(0.89)),
    el(57, "La", 138.91, 6, 3, Some(1.10)),
    el(58, "Ce", 140.12, 6, 3, Some(1.12)),
    el(59, "Pr", 140.91, 6, 3, Some(1.13)),
    el(60, "Nd", 144.24, 6, 3, Some(1.14)),
    el(61, "Pm", 145.0, 6, 3, Some(1.13)),
    el(62, "Sm", 150.36, 6, 3, Some(1.17)),
    el(63, "Eu", 151.96, 6, 3, Some(1.2)),
    el(64, "Gd", 157.25, 6, 3, Some(1.2)),
    el(65, "Tb", 158.93, 6, 3, Some(1.2)),
    el(66, "Dy", 162.50, 6, 3, Some(1.22)),
    el(67, "Ho", 164.93, 6, 3, Some(1.23)),
    el(68, "Er", 167.26, 6, 3, Some(1.24)),
    el(69, "Tm", 168.93, 6, 3, Some(1.25)),
    el(70, "Yb", 173.05, 6, 3, Some(1.1)),
    el(71, "Lu", 174.97, 6, 3, Some(1.27)),
    el(72, "Hf", 178.49, 6, 4, Some(1.3)),
    el(73, "Ta", 180.95, 6, 5, Some(1.5)),
    el(74, "W", 183.84, 6, 6, Some(2.36)),
    el(75, "Re", 186.21, 6, 7, Some(1.9)),
    el(76, "Os", 190.23, 6, 8, Some(2.2)),
    el(77, "Ir", 192.22, 6, 9, Some(2.20)),
    el(78, "Pt", 195.08, 6, 10, Some(2.28)),
    el(79, "Au", 196.97, 6, 11, Some(2.54)),
    el(80, "Hg", 200.59, 6, 12, Some(2.00)),
    el(81, "Tl", 204.38, 6, 13, Some(1.62)),
    el(82, "Pb", 207.2, 6, 14, Some(2.33)),
    el(83, "Bi", 208.98, 6, 15, Some(2.02)),
    el(84, "Po", 209.0, 6, 16, Some(2.0)),
    el(85, "At", 210.0, 6, 17, Some(2.2)),
    el(86, "Rn", 222.0, 6, 18, None),
    el(87, "Fr", 223.0, 7, 1, Some(0.7)),
    el(88, "Ra", 226.0, 7, 2, Some(0.9)),
    el(89, "Ac", 227.0, 7, 3, Some(1.1)),
    el(90, "Th", 232.04, 7, 3, Some(1.3)),
    el(91, "Pa", 231.04, 7, 3, Some(1.5)),
    el(92, "U", 238.03, 7, 3, Some(1.38)),
    el(93, "Np", 237.0, 7, 3, Some(1.36)),
    el(94, "Pu", 244.0, 7, 3, Some(1.28)),
    el(95, "Am", 243.0, 7, 3, Some(1.3)),
    el(96, "Cm", 247.0, 7, 3, Some(1.3)),
    el(97, "Bk", 247.0, 7, 3, Some(1.3)),
    el(98, "Cf", 251.0, 7, 3, Some(1.3)),
    el(99, "Es", 252.0, 7, 3, Some(1.3)),
    el(100, "Fm", 257.0, 7, 3, Some(1.3)),
    el(101, "Md", 258.0, 7, 3, Some(1.3)),
    el(102, "No", 259.0, 7, 3, Some(1.3)),
    el(103, "Lr", 262.0, 7, 3, Some(1.3)),
];

/// A chemical element, identified by atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    /// Look up an element by its exact (case-sensitive) symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        ELEMENTS
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| Element(e.number))
    }

    /// Look up an element by atomic number.
    pub fn from_number(number: u8) -> Option<Self> {
        if (1..=ELEMENTS.len() as u8).contains(&number) {
            Some(Element(number))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        self.data().symbol
    }

    pub fn data(self) -> &'static ElementData {
        &ELEMENTS[self.0 as usize - 1]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_atomic_number() {
        for (i, data) in ELEMENTS.iter().enumerate() {
            assert_eq!(data.number as usize, i + 1, "{} out of place", data.symbol);
        }
    }

    #[test]
    fn symbol_lookup_is_case_sensitive() {
        let fe = Element::from_symbol("Fe").unwrap();
        assert_eq!(fe.number(), 26);
        assert_eq!(fe.data().row, 4);
        assert!(Element::from_symbol("fe").is_none());
        assert!(Element::from_symbol("FE").is_none());
        assert!(Element::from_symbol("Xx").is_none());
    }

    #[test]
    fn from_number_rejects_out_of_range() {
        assert!(Element::from_number(0).is_none());
        assert!(Element::from_number(104).is_none());
        assert_eq!(Element::from_number(8).unwrap().symbol(), "O");
    }
}
