//! Turning recipe ingredient lines into catalog searches and picking a product.

use crate::application::ports::premium::Product;

/// Units and filler words that say nothing about the product.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "of", "or", "to", "the", "for", "fresh", "freshly", "chopped", "diced",
    "minced", "sliced", "large", "small", "medium", "cup", "cups", "tbsp", "tablespoon",
    "tablespoons", "tsp", "teaspoon", "teaspoons", "oz", "ounce", "ounces", "lb", "lbs", "pound",
    "pounds", "g", "kg", "ml", "l", "pinch", "clove", "cloves", "can", "cans", "taste",
];

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// "2 cups chopped fresh spinach" -> "spinach".
pub fn search_term(ingredient: &str) -> String {
    // Drop trailing preparation notes ("onion, finely diced").
    let head = ingredient.split(',').next().unwrap_or(ingredient);
    let words = tokens(head);
    if words.is_empty() {
        ingredient.trim().to_lowercase()
    } else {
        words.join(" ")
    }
}

/// Product sharing the most tokens with the ingredient. Cheaper wins a tie.
/// `None` when nothing overlaps at all.
pub fn best_match<'a>(ingredient: &str, products: &'a [Product]) -> Option<&'a Product> {
    let wanted = tokens(ingredient);
    if wanted.is_empty() {
        return None;
    }

    products
        .iter()
        .map(|p| {
            let have = tokens(&p.name);
            let score = wanted.iter().filter(|w| have.contains(w)).count();
            (score, p)
        })
        .filter(|(score, _)| *score > 0)
        .max_by(|(sa, pa), (sb, pb)| {
            sa.cmp(sb)
                .then_with(|| pb.price.total_cmp(&pa.price))
        })
        .map(|(_, p)| p)
}
