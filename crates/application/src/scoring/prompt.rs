//! Rubric prompts and self-consistency variants.
//!
//! Every variant shares the same rubric and output contract; variants differ
//! only in the calibration phrasing, which nudges the model to reason about the
//! answer from a slightly different angle.

use answer_grader_domain::ProviderName;

const RUBRIC: &str = "\
You are grading a free-text answer against an expected answer.
Score each criterion on a scale from 0 to 5 (decimals allowed):
- completeness: does the answer cover every point in the expected answer?
- conciseness: is the answer free of padding, repetition and digressions?
- correctness: is everything the answer states factually consistent with the expected answer?";

const CALIBRATIONS: [&str; 4] = [
    "Calibration: 5 means indistinguishable from the expected answer, 0 means unrelated or empty.",
    "Calibration: start from 5 and subtract one point for each missing, superfluous or wrong element.",
    "Calibration: a paraphrase with identical meaning deserves 5; a partially right answer sits around 2-3.",
    "Calibration: judge as a strict examiner would; reserve 5 for answers with no flaw at all.",
];

const OUTPUT_CONTRACT: &str = "\
Respond with a single JSON object and nothing else, for example:
{\"completeness\": 4, \"conciseness\": 5, \"correctness\": 3}";

/// Number of distinct calibration phrasings; variant indices wrap around this
pub fn phrasing_count() -> usize {
    CALIBRATIONS.len()
}

/// Build the prompt for one variant
pub fn build_prompt(variant: u32, question: &str, expected: &str, candidate: &str) -> String {
    let calibration = CALIBRATIONS[variant as usize % CALIBRATIONS.len()];
    format!(
        "{RUBRIC}\n{calibration}\n\nQuestion:\n{question}\n\nExpected answer:\n{expected}\n\nCandidate answer:\n{candidate}\n\n{OUTPUT_CONTRACT}"
    )
}

/// Deterministic seed for a provider/variant pair (FNV-1a over the name, mixed with the index)
pub fn variant_seed(provider: &ProviderName, variant: u32) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in provider.as_str().bytes().chain(variant.to_le_bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_inputs_and_contract() {
        let prompt = build_prompt(0, "Capital of France?", "Paris.", "It is Paris.");
        assert!(prompt.contains("Capital of France?"));
        assert!(prompt.contains("Expected answer:\nParis."));
        assert!(prompt.contains("Candidate answer:\nIt is Paris."));
        assert!(prompt.contains("\"correctness\""));
    }

    #[test]
    fn test_variants_differ_and_wrap() {
        let first = build_prompt(0, "q", "e", "c");
        let second = build_prompt(1, "q", "e", "c");
        assert_ne!(first, second);
        assert_eq!(first, build_prompt(phrasing_count() as u32, "q", "e", "c"));
    }

    #[test]
    fn test_seeds_are_stable_and_distinct() {
        let openai = ProviderName::new("openai");
        let anthropic = ProviderName::new("anthropic");
        assert_eq!(variant_seed(&openai, 1), variant_seed(&openai, 1));
        assert_ne!(variant_seed(&openai, 0), variant_seed(&openai, 1));
        assert_ne!(variant_seed(&openai, 0), variant_seed(&anthropic, 0));
    }
}
