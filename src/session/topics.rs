//! Related-topic suggestion
//!
//! Deterministic lookup against an ordered table of subject keyword families;
//! first matching family wins and returns its fixed five-item list. Topics
//! with no family fall back to templated titles built around the first
//! meaningful word of the query.

/// Number of suggestions every lookup produces
pub const TOPIC_COUNT: usize = 5;

/// Ordered keyword-family table: any needle matching (case-insensitive
/// substring) selects the family. The water-states family additionally
/// requires a state/phase word and is handled before this table.
const FAMILIES: &[(&[&str], [&str; TOPIC_COUNT])] = &[
    (
        &["photosynthesis"],
        [
            "Cellular respiration",
            "Chloroplasts and cell structure",
            "The carbon cycle",
            "Plant nutrition and growth",
            "Ecosystems and food chains",
        ],
    ),
    (
        &["gravity", "gravitational"],
        [
            "Newton's laws of motion",
            "Orbital mechanics",
            "Tides and lunar effects",
            "Weight vs mass",
            "Einstein's general relativity",
        ],
    ),
    (
        &["atom", "atomic"],
        [
            "Electron configuration",
            "Chemical bonding",
            "Periodic table trends",
            "Isotopes and radioactivity",
            "Quantum mechanics basics",
        ],
    ),
    (
        &["dna", "genetic"],
        [
            "RNA and protein synthesis",
            "Gene expression and regulation",
            "Heredity and inheritance",
            "Mutations and evolution",
            "CRISPR and genetic engineering",
        ],
    ),
    (
        &["evolution", "natural selection"],
        [
            "Genetics and heredity",
            "Fossil evidence",
            "Speciation and biodiversity",
            "Adaptation and survival",
            "Human evolution",
        ],
    ),
    (
        &["machine learning", "ai", "artificial intelligence"],
        [
            "Neural networks basics",
            "Deep learning fundamentals",
            "Supervised vs unsupervised learning",
            "AI ethics and bias",
            "Computer vision and NLP",
        ],
    ),
    (
        &["neural network", "deep learning"],
        [
            "Backpropagation algorithm",
            "Convolutional neural networks",
            "Recurrent neural networks",
            "Gradient descent optimization",
            "Overfitting and regularization",
        ],
    ),
    (
        &["embedding", "vector"],
        [
            "Natural language processing",
            "Similarity and distance metrics",
            "Dimensionality reduction",
            "Word2Vec and GloVe",
            "Transformer models",
        ],
    ),
    (
        &["algorithm", "programming"],
        [
            "Data structures fundamentals",
            "Big O notation and complexity",
            "Sorting and searching algorithms",
            "Graph algorithms",
            "Dynamic programming",
        ],
    ),
    (
        &["data structure"],
        [
            "Arrays and linked lists",
            "Trees and binary search trees",
            "Hash tables and dictionaries",
            "Stacks and queues",
            "Graphs and networks",
        ],
    ),
    (
        &["calculus", "derivative", "integral"],
        [
            "Limits and continuity",
            "Applications of derivatives",
            "Integration techniques",
            "Differential equations",
            "Vector calculus",
        ],
    ),
    (
        &["algebra", "equation"],
        [
            "Linear equations and systems",
            "Quadratic functions",
            "Exponential and logarithmic functions",
            "Polynomial operations",
            "Matrix algebra",
        ],
    ),
    (
        &["geometry", "triangle", "circle"],
        [
            "Pythagorean theorem",
            "Trigonometry basics",
            "Area and perimeter formulas",
            "Coordinate geometry",
            "Geometric proofs",
        ],
    ),
    (
        &["statistics", "probability"],
        [
            "Descriptive statistics",
            "Normal distribution",
            "Hypothesis testing",
            "Correlation and regression",
            "Sampling and confidence intervals",
        ],
    ),
    (
        &["energy", "kinetic", "potential"],
        [
            "Conservation of energy",
            "Work and power",
            "Thermodynamics basics",
            "Heat transfer mechanisms",
            "Renewable energy sources",
        ],
    ),
    (
        &["wave", "frequency"],
        [
            "Sound waves and acoustics",
            "Light waves and optics",
            "Electromagnetic spectrum",
            "Wave interference",
            "Doppler effect",
        ],
    ),
    (
        &["electric", "current", "voltage"],
        [
            "Ohm's law and resistance",
            "Magnetism and electromagnetism",
            "Electric circuits",
            "Power and energy in circuits",
            "AC vs DC current",
        ],
    ),
    (
        &["chemical", "reaction", "bond"],
        [
            "Types of chemical reactions",
            "Balancing chemical equations",
            "Acids and bases",
            "Oxidation and reduction",
            "Chemical equilibrium",
        ],
    ),
    (
        &["periodic table", "element"],
        [
            "Atomic structure",
            "Electron configuration",
            "Chemical bonding",
            "Metallic and nonmetallic properties",
            "Noble gases and reactivity",
        ],
    ),
    (
        &["democracy", "government"],
        [
            "Types of government systems",
            "Constitutional principles",
            "Voting and elections",
            "Separation of powers",
            "Civil rights and liberties",
        ],
    ),
    (
        &["economy", "economic"],
        [
            "Supply and demand",
            "Market structures",
            "Inflation and deflation",
            "Fiscal and monetary policy",
            "International trade",
        ],
    ),
    (
        &["cell", "cellular"],
        [
            "Cell membrane and transport",
            "Mitosis and meiosis",
            "Organelles and their functions",
            "Prokaryotes vs eukaryotes",
            "Cell cycle regulation",
        ],
    ),
    (
        &["ecosystem", "environment"],
        [
            "Food chains and webs",
            "Biodiversity and conservation",
            "Climate change effects",
            "Nutrient cycles",
            "Population dynamics",
        ],
    ),
];

const WATER_STATES_FAMILY: [&str; TOPIC_COUNT] = [
    "Phase transitions and energy",
    "Molecular behavior in different states",
    "Sublimation and deposition",
    "Critical point and triple point",
    "States of matter in everyday life",
];

const QUESTION_WORDS: &[&str] = &["how", "what", "why", "explain", "define"];

/// Fixed five related-topic titles for a studied topic
pub fn related_topics(topic: &str) -> Vec<String> {
    let lower = topic.to_lowercase();

    // Water states needs two needles at once, so it sits outside the table
    if lower.contains("water") && (lower.contains("state") || lower.contains("phase")) {
        return WATER_STATES_FAMILY.iter().map(ToString::to_string).collect();
    }

    for (needles, family) in FAMILIES {
        if needles.iter().any(|needle| lower.contains(needle)) {
            return family.iter().map(ToString::to_string).collect();
        }
    }

    templated_topics(topic, &lower)
}

/// Fallback titles built around the first meaningful word of the query
fn templated_topics(topic: &str, lower: &str) -> Vec<String> {
    let keyword = first_meaningful_word(topic);

    let is_question = lower
        .split_whitespace()
        .any(|word| QUESTION_WORDS.contains(&word));

    if is_question {
        vec![
            format!("Advanced {keyword} concepts"),
            format!("{keyword} in real-world applications"),
            format!("Common misconceptions about {keyword}"),
            format!("{keyword} vs related concepts"),
            format!("Future developments in {keyword}"),
        ]
    } else {
        vec![
            format!("Fundamentals of {keyword}"),
            format!("Types and classifications of {keyword}"),
            format!("{keyword} mechanisms and processes"),
            format!("Practical applications of {keyword}"),
            format!("Recent advances in {keyword}"),
        ]
    }
}

/// First word longer than three characters, punctuation stripped; the full
/// topic when no word qualifies
fn first_meaningful_word(topic: &str) -> String {
    topic
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|word| word.chars().count() > 3)
        .map_or_else(|| topic.trim().to_string(), str::to_lowercase)
}
