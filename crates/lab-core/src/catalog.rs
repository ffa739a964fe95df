//! Puzzle set catalog
//!
//! Four parallel content variants (A-D). Every set carries its own
//! equations, elements and conditions plus the code each puzzle expects.
//! Sets are immutable: groups mid-session rely on their codes staying
//! stable, so a new variant means a new entry, never an edit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a content variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SetId {
    A,
    B,
    C,
    D,
}

impl SetId {
    /// All sets in rotation order
    pub const ALL: [SetId; 4] = [SetId::A, SetId::B, SetId::C, SetId::D];

    /// Next set in the cycle A -> B -> C -> D -> A
    pub fn next(self) -> SetId {
        match self {
            SetId::A => SetId::B,
            SetId::B => SetId::C,
            SetId::C => SetId::D,
            SetId::D => SetId::A,
        }
    }
}

impl Default for SetId {
    fn default() -> Self {
        SetId::A
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetId::A => "A",
            SetId::B => "B",
            SetId::C => "C",
            SetId::D => "D",
        };
        write!(f, "{}", s)
    }
}

/// Error returned when parsing an unknown set name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSetIdError(pub String);

impl fmt::Display for ParseSetIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown puzzle set '{}' (expected A, B, C or D)", self.0)
    }
}

impl std::error::Error for ParseSetIdError {}

impl FromStr for SetId {
    type Err = ParseSetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(SetId::A),
            "B" => Ok(SetId::B),
            "C" => Ok(SetId::C),
            "D" => Ok(SetId::D),
            _ => Err(ParseSetIdError(s.to_string())),
        }
    }
}

/// The three puzzles of a run, in play order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Puzzle {
    /// Reaction logic: balance and classify equations
    ReactionLogic,
    /// Periodic table: filter and order elements
    PeriodicTable,
    /// Reaction conditions: match reaction kinds to conditions
    ReactionConditions,
}

impl Puzzle {
    pub const ALL: [Puzzle; 3] = [
        Puzzle::ReactionLogic,
        Puzzle::PeriodicTable,
        Puzzle::ReactionConditions,
    ];

    /// 1-based puzzle number as shown to players
    pub fn number(self) -> usize {
        match self {
            Puzzle::ReactionLogic => 1,
            Puzzle::PeriodicTable => 2,
            Puzzle::ReactionConditions => 3,
        }
    }

    pub fn from_number(n: usize) -> Option<Puzzle> {
        match n {
            1 => Some(Puzzle::ReactionLogic),
            2 => Some(Puzzle::PeriodicTable),
            3 => Some(Puzzle::ReactionConditions),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Puzzle::ReactionLogic => "Reaction Logic",
            Puzzle::PeriodicTable => "Periodic Table",
            Puzzle::ReactionConditions => "Reaction Conditions",
        }
    }

    /// Number of digits in this puzzle's code
    pub fn code_len(self) -> usize {
        match self {
            Puzzle::ReactionLogic | Puzzle::PeriodicTable => 4,
            Puzzle::ReactionConditions => 3,
        }
    }
}

// ==================== Puzzle 1: Reaction Logic ====================

/// Reaction classification used by Puzzle 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionType {
    SingleReplacement,
    DoubleReplacement,
    AcidBase,
    Combustion,
    Decomposition,
}

impl ReactionType {
    /// Digit position of this type in the Puzzle 1 code.
    /// Decomposition never contributes a digit.
    pub fn code_slot(self) -> Option<usize> {
        match self {
            ReactionType::SingleReplacement => Some(0),
            ReactionType::DoubleReplacement => Some(1),
            ReactionType::AcidBase => Some(2),
            ReactionType::Combustion => Some(3),
            ReactionType::Decomposition => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReactionType::SingleReplacement => "Single Replacement",
            ReactionType::DoubleReplacement => "Double Replacement",
            ReactionType::AcidBase => "Acid–Base",
            ReactionType::Combustion => "Combustion",
            ReactionType::Decomposition => "Decomposition",
        }
    }
}

/// One equation of Puzzle 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Equation {
    /// Formulas and operators (`+`, `→`) in display order
    pub parts: &'static [&'static str],
    pub reaction: ReactionType,
    /// Formula whose coefficient is extracted; `None` means use water's
    pub extract_from: Option<&'static str>,
    /// Balanced coefficient of `extract_from`
    pub coefficient: u32,
    /// Decoys are never part of the code
    pub decoy: bool,
}

impl Equation {
    /// Digit this equation contributes (last digit for coefficients > 9)
    pub fn code_digit(&self) -> u32 {
        self.coefficient % 10
    }

    /// Formula tokens, operators stripped
    pub fn formulas(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parts
            .iter()
            .copied()
            .filter(|p| *p != "+" && *p != "→")
    }
}

// ==================== Puzzle 2: Periodic Table ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementCategory {
    Metal,
    NonMetal,
    NobleGas,
    Metalloid,
}

/// One element card of Puzzle 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Element {
    pub symbol: &'static str,
    pub name: &'static str,
    pub atomic_number: u8,
    /// Common ionic charge, 0 for noble gases
    pub charge: i8,
    pub category: ElementCategory,
}

impl Element {
    /// Metals forming +1 or +2 ions are the ones players select
    pub fn qualifies(&self) -> bool {
        self.category == ElementCategory::Metal && (self.charge == 1 || self.charge == 2)
    }
}

// ==================== Puzzle 3: Reaction Conditions ====================

/// Reaction kinds matched in Puzzle 3, independent of set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    Combustion,
    AcidBase,
    SingleReplacement,
    Decomposition,
}

impl ReactionKind {
    /// Display order on the matching board
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Combustion,
        ReactionKind::AcidBase,
        ReactionKind::SingleReplacement,
        ReactionKind::Decomposition,
    ];

    /// Kinds contributing to the Puzzle 3 code, in code order
    pub const CODE_ORDER: [ReactionKind; 3] = [
        ReactionKind::SingleReplacement,
        ReactionKind::AcidBase,
        ReactionKind::Combustion,
    ];

    /// Short id used by the matching UI
    pub fn id(self) -> &'static str {
        match self {
            ReactionKind::Combustion => "comb",
            ReactionKind::AcidBase => "acid",
            ReactionKind::SingleReplacement => "single",
            ReactionKind::Decomposition => "decomp",
        }
    }

    pub fn from_id(id: &str) -> Option<ReactionKind> {
        ReactionKind::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            ReactionKind::Combustion => "Combustion",
            ReactionKind::AcidBase => "Acid–Base",
            ReactionKind::SingleReplacement => "Single Replacement",
            ReactionKind::Decomposition => "Decomposition",
        }
    }
}

/// One condition card of Puzzle 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub id: &'static str,
    pub name: &'static str,
    /// Digit used when building the code (1-9)
    pub value: u8,
}

// ==================== Puzzle set aggregate ====================

/// Codes each puzzle of a set accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedCodes {
    pub p1: &'static str,
    pub p2: &'static str,
    pub p3: &'static str,
}

/// A complete content variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PuzzleSet {
    pub id: SetId,
    pub equations: &'static [Equation],
    pub elements: &'static [Element],
    pub conditions: &'static [Condition],
    /// Reaction kind -> condition id, one-to-one
    pub correct_matches: &'static [(ReactionKind, &'static str)],
    pub expected: ExpectedCodes,
}

impl PuzzleSet {
    /// Declared code for `puzzle`. This is what validation compares against.
    pub fn expected_code(&self, puzzle: Puzzle) -> &'static str {
        match puzzle {
            Puzzle::ReactionLogic => self.expected.p1,
            Puzzle::PeriodicTable => self.expected.p2,
            Puzzle::ReactionConditions => self.expected.p3,
        }
    }

    /// Equations that contribute to the code, in code slot order
    pub fn scorable_equations(&self) -> Vec<&'static Equation> {
        let mut scorable: Vec<&'static Equation> =
            self.equations.iter().filter(|e| !e.decoy).collect();
        scorable.sort_by_key(|e| e.reaction.code_slot());
        scorable
    }

    pub fn decoys(&self) -> impl Iterator<Item = &'static Equation> {
        self.equations.iter().filter(|e| e.decoy)
    }

    /// Elements a player should select, ordered by charge then atomic number
    pub fn qualifying_elements(&self) -> Vec<&'static Element> {
        let mut selected: Vec<&'static Element> =
            self.elements.iter().filter(|e| e.qualifies()).collect();
        selected.sort_by_key(|e| (e.charge, e.atomic_number));
        selected
    }

    pub fn condition(&self, id: &str) -> Option<&'static Condition> {
        self.conditions.iter().find(|c| c.id == id)
    }

    /// Correct condition for a reaction kind
    pub fn matched_condition(&self, kind: ReactionKind) -> Option<&'static Condition> {
        self.correct_matches
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, id)| self.condition(id))
    }

    /// Puzzle 1 code rebuilt from the equations
    pub fn derived_p1_code(&self) -> String {
        self.scorable_equations()
            .iter()
            .map(|e| e.code_digit().to_string())
            .collect()
    }

    /// Puzzle 2 code rebuilt from the qualifying elements
    pub fn derived_p2_code(&self) -> String {
        self.qualifying_elements()
            .iter()
            .map(|e| format!("{:02}", e.atomic_number))
            .collect()
    }

    /// Puzzle 3 code rebuilt from the correct matches
    pub fn derived_p3_code(&self) -> String {
        ReactionKind::CODE_ORDER
            .iter()
            .filter_map(|k| self.matched_condition(*k))
            .map(|c| c.value.to_string())
            .collect()
    }

    /// Progressive hint for `puzzle`, `level` 1..=3
    pub fn hint(&self, puzzle: Puzzle, level: usize) -> Option<String> {
        let hints: [String; 3] = match puzzle {
            Puzzle::ReactionLogic => [
                "One equation is a decoy (Decomposition).".to_string(),
                "Use the product with the same metal as the reactant (e.g. Zn → ZnSO₄).".to_string(),
                "Order: Single → Double → Acid-Base → Combustion.".to_string(),
            ],
            Puzzle::PeriodicTable => {
                let excluded: Vec<&str> = self
                    .elements
                    .iter()
                    .filter(|e| !e.qualifies() && e.category != ElementCategory::NonMetal)
                    .map(|e| e.symbol)
                    .collect();
                let selected: Vec<String> = self
                    .qualifying_elements()
                    .iter()
                    .map(|e| format!("{} ({})", e.symbol, e.atomic_number))
                    .collect();
                [
                    format!("{} circled elements are excluded.", excluded.len()),
                    format!(
                        "Ignore noble gases, metalloids and metals with +3 charge or more ({}).",
                        excluded.join(", ")
                    ),
                    format!("Selected: {}. Order by charge.", selected.join(" and ")),
                ]
            }
            Puzzle::ReactionConditions => [
                "Think of common lab setups.".to_string(),
                "Decomposition often needs extreme energy input (like electricity).".to_string(),
                "Acid-Base usually occurs in water (aqueous solution).".to_string(),
            ],
        };
        level
            .checked_sub(1)
            .and_then(|i| hints.get(i))
            .cloned()
    }
}

/// Resolve a set id to its content
pub fn get_set(id: SetId) -> &'static PuzzleSet {
    match id {
        SetId::A => &SET_A,
        SetId::B => &SET_B,
        SetId::C => &SET_C,
        SetId::D => &SET_D,
    }
}

/// Reference final code of a set.
///
/// For preview and audit only. A live group is judged against the codes it
/// actually recorded, see [`crate::validate::is_final_correct`].
pub fn get_final_code(id: SetId) -> String {
    let set = get_set(id);
    format!("{}{}{}", set.expected.p1, set.expected.p2, set.expected.p3)
}

/// One row of the admin preview table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub set: SetId,
    pub p1: &'static str,
    pub p2: &'static str,
    pub p3: &'static str,
    #[serde(rename = "final")]
    pub final_code: String,
}

/// Expected codes for every set
pub fn preview() -> Vec<PreviewRow> {
    SetId::ALL
        .iter()
        .map(|&id| {
            let set = get_set(id);
            PreviewRow {
                set: id,
                p1: set.expected.p1,
                p2: set.expected.p2,
                p3: set.expected.p3,
                final_code: get_final_code(id),
            }
        })
        .collect()
}

// ==================== Set data ====================

use ElementCategory::{Metal, Metalloid, NobleGas, NonMetal};
use ReactionType::{AcidBase, Combustion, Decomposition, DoubleReplacement, SingleReplacement};

const fn eq(
    parts: &'static [&'static str],
    reaction: ReactionType,
    extract_from: Option<&'static str>,
    coefficient: u32,
) -> Equation {
    Equation {
        parts,
        reaction,
        extract_from,
        coefficient,
        decoy: false,
    }
}

const fn decoy(
    parts: &'static [&'static str],
    extract_from: Option<&'static str>,
    coefficient: u32,
) -> Equation {
    Equation {
        parts,
        reaction: Decomposition,
        extract_from,
        coefficient,
        decoy: true,
    }
}

const fn el(
    symbol: &'static str,
    name: &'static str,
    atomic_number: u8,
    charge: i8,
    category: ElementCategory,
) -> Element {
    Element {
        symbol,
        name,
        atomic_number,
        charge,
        category,
    }
}

const fn cond(id: &'static str, name: &'static str, value: u8) -> Condition {
    Condition { id, name, value }
}

// Equations are listed scrambled; the code order comes from the reaction type.

static SET_A: PuzzleSet = PuzzleSet {
    id: SetId::A,
    equations: &[
        eq(&["C₃H₈", "+", "O₂", "→", "CO₂", "+", "H₂O"], Combustion, None, 4),
        decoy(&["KClO₃", "→", "KCl", "+", "O₂"], Some("KCl"), 2),
        eq(&["Zn", "+", "CuSO₄", "→", "ZnSO₄", "+", "Cu"], SingleReplacement, Some("ZnSO₄"), 1),
        eq(&["H₂SO₄", "+", "NaOH", "→", "Na₂SO₄", "+", "H₂O"], AcidBase, Some("Na₂SO₄"), 1),
        eq(&["AgNO₃", "+", "NaCl", "→", "AgCl", "+", "NaNO₃"], DoubleReplacement, Some("AgCl"), 1),
    ],
    elements: &[
        el("Na", "Sodium", 11, 1, Metal),
        el("Mg", "Magnesium", 12, 2, Metal),
        el("Al", "Aluminum", 13, 3, Metal),
        el("Cl", "Chlorine", 17, -1, NonMetal),
        el("Ar", "Argon", 18, 0, NobleGas),
    ],
    conditions: &[
        cond("heat", "Requires heat", 1),
        cond("elec", "Requires electricity", 2),
        cond("gas", "Produces gas", 3),
        cond("aq", "Occurs in aqueous solution", 4),
    ],
    correct_matches: &[
        (ReactionKind::Combustion, "heat"),
        (ReactionKind::AcidBase, "aq"),
        (ReactionKind::SingleReplacement, "gas"),
        (ReactionKind::Decomposition, "elec"),
    ],
    expected: ExpectedCodes {
        p1: "1114",
        p2: "1112",
        p3: "341",
    },
};

static SET_B: PuzzleSet = PuzzleSet {
    id: SetId::B,
    equations: &[
        decoy(&["CaCO₃", "→", "CaO", "+", "CO₂"], Some("CaO"), 1),
        eq(&["CH₄", "+", "O₂", "→", "CO₂", "+", "H₂O"], Combustion, None, 2),
        eq(&["BaCl₂", "+", "Na₂SO₄", "→", "BaSO₄", "+", "NaCl"], DoubleReplacement, Some("BaSO₄"), 1),
        eq(&["Fe", "+", "CuCl₂", "→", "FeCl₂", "+", "Cu"], SingleReplacement, Some("FeCl₂"), 1),
        eq(&["HCl", "+", "KOH", "→", "KCl", "+", "H₂O"], AcidBase, Some("KCl"), 1),
    ],
    elements: &[
        el("K", "Potassium", 19, 1, Metal),
        el("Ca", "Calcium", 20, 2, Metal),
        el("Al", "Aluminum", 13, 3, Metal),
        el("S", "Sulfur", 16, -2, NonMetal),
        el("Ar", "Argon", 18, 0, NobleGas),
    ],
    conditions: &[
        cond("oxygen", "Needs oxygen", 1),
        cond("saltwater", "Produces salt + water", 2),
        cond("hydrogen", "Produces hydrogen gas", 3),
        cond("energy", "Needs energy input", 4),
    ],
    correct_matches: &[
        (ReactionKind::Combustion, "oxygen"),
        (ReactionKind::AcidBase, "saltwater"),
        (ReactionKind::SingleReplacement, "hydrogen"),
        (ReactionKind::Decomposition, "energy"),
    ],
    expected: ExpectedCodes {
        p1: "1112",
        p2: "1920",
        p3: "321",
    },
};

static SET_C: PuzzleSet = PuzzleSet {
    id: SetId::C,
    equations: &[
        eq(&["HNO₃", "+", "NaOH", "→", "NaNO₃", "+", "H₂O"], AcidBase, Some("NaNO₃"), 1),
        eq(&["C₂H₆", "+", "O₂", "→", "CO₂", "+", "H₂O"], Combustion, None, 6),
        eq(&["Mg", "+", "HCl", "→", "MgCl₂", "+", "H₂"], SingleReplacement, Some("MgCl₂"), 1),
        decoy(&["NaCl", "+", "Na", "→", "Cl₂"], None, 2),
        eq(&["Pb(NO₃)₂", "+", "KI", "→", "PbI₂", "+", "KNO₃"], DoubleReplacement, Some("PbI₂"), 1),
    ],
    elements: &[
        el("Li", "Lithium", 3, 1, Metal),
        el("Be", "Beryllium", 4, 2, Metal),
        el("B", "Boron", 5, 3, Metal),
        el("O", "Oxygen", 8, -2, NonMetal),
        el("Ne", "Neon", 10, 0, NobleGas),
    ],
    conditions: &[
        cond("energyrel", "Rapid energy release", 1),
        cond("neutral", "Neutralization", 2),
        cond("bubbles", "Gas bubbles observed", 3),
        cond("simpler", "Breaks into simpler substances", 4),
    ],
    correct_matches: &[
        (ReactionKind::Combustion, "energyrel"),
        (ReactionKind::AcidBase, "neutral"),
        (ReactionKind::SingleReplacement, "bubbles"),
        (ReactionKind::Decomposition, "simpler"),
    ],
    expected: ExpectedCodes {
        p1: "1116",
        p2: "0304",
        p3: "321",
    },
};

static SET_D: PuzzleSet = PuzzleSet {
    id: SetId::D,
    equations: &[
        eq(&["AgNO₃", "+", "KBr", "→", "AgBr", "+", "KNO₃"], DoubleReplacement, Some("AgBr"), 1),
        decoy(&["2KClO₃", "→", "2KCl", "+", "3O₂"], Some("KCl"), 2),
        eq(&["C₆H₁₂", "+", "O₂", "→", "CO₂", "+", "H₂O"], Combustion, None, 6),
        eq(&["Zn", "+", "H₂SO₄", "→", "ZnSO₄", "+", "H₂"], SingleReplacement, Some("ZnSO₄"), 1),
        eq(&["H₃PO₄", "+", "NaOH", "→", "Na₃PO₄", "+", "H₂O"], AcidBase, Some("Na₃PO₄"), 1),
    ],
    elements: &[
        el("Na", "Sodium", 11, 1, Metal),
        el("Mg", "Magnesium", 12, 2, Metal),
        el("Si", "Silicon", 14, 4, Metalloid),
        el("Cl", "Chlorine", 17, -1, NonMetal),
        el("Kr", "Krypton", 36, 0, NobleGas),
    ],
    conditions: &[
        cond("flame", "Flame present", 1),
        cond("ph7", "pH moves toward 7", 2),
        cond("displace", "Metal displaces another", 3),
        cond("splits", "One reactant forms two products", 4),
    ],
    correct_matches: &[
        (ReactionKind::Combustion, "flame"),
        (ReactionKind::AcidBase, "ph7"),
        (ReactionKind::SingleReplacement, "displace"),
        (ReactionKind::Decomposition, "splits"),
    ],
    expected: ExpectedCodes {
        p1: "1116",
        p2: "1112",
        p3: "321",
    },
};
