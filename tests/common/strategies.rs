use proptest::prelude::*;

/// Strategy for attachment locators as the ticketing system hands them out
pub fn locator_strategy() -> impl Strategy<Value = String> {
    "https://trello\\.com/1/cards/[a-f0-9]{8}/attachments/[a-f0-9]{6}/download/[a-zA-Z0-9_-]{1,20}\\.(pdf|docx|png)"
}

/// Strategy for ordered attachment lists, including the empty list
pub fn locators_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(locator_strategy(), 0..8)
}

/// Strategy for student names with accents and spaces
pub fn student_name_strategy() -> impl Strategy<Value = String> {
    "[A-ZÁÉÍÓÚ][a-záéíóúãõç]{1,12}( [A-ZÁÉÍÓÚ][a-záéíóúãõç]{1,12}){0,3}"
}

/// Strategy for mixed-case renderings of a fixed identifier
pub fn case_variant_strategy(word: &'static str) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), word.len()).prop_map(move |upper| {
        word.chars()
            .zip(upper)
            .map(|(c, up)| {
                if up {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    })
}
