// ABOUTME: Static keyword tables for category inference, search synonyms, and allergens
// ABOUTME: Keywords match whole words of a food name, plurals included
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Keyword tables
//!
//! Category rules are checked in order and the first hit wins, so more
//! specific groups (dairy before fats, fruits before vegetables) come first.
//! Entries are matched as whole words by [`crate::text::NameTokens`], so
//! "egg" never fires on "eggplant" and "oil" never fires on "boiled".

/// Words that mark a food as protein
pub const PROTEIN_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "lamb", "turkey", "duck", "fish", "salmon", "tuna", "cod",
    "shrimp", "prawn", "crab", "lobster", "steak", "bacon", "ham", "sausage", "egg", "tofu",
    "tempeh", "bean", "lentil", "chickpea", "meat", "burger", "cheeseburger", "hamburger",
    "meatball",
];

/// Words that mark a food as carbohydrates
pub const CARBOHYDRATE_KEYWORDS: &[&str] = &[
    "rice", "bread", "pasta", "noodle", "spaghetti", "potato", "fries", "oats", "cereal",
    "quinoa", "couscous", "oatmeal", "tortilla", "bagel", "toast", "pizza", "cracker", "pancake",
    "waffle", "bun", "roll", "corn", "cake", "cookie",
];

/// Words that mark a food as dairy
pub const DAIRY_KEYWORDS: &[&str] = &[
    "milk", "cheese", "yogurt", "yoghurt", "cream", "butter", "mozzarella", "cheddar",
    "parmesan", "kefir",
];

/// Words that mark a food as fruit
pub const FRUIT_KEYWORDS: &[&str] = &[
    "apple", "banana", "orange", "grape", "strawberry", "blueberry", "raspberry", "berry",
    "mango", "pineapple", "peach", "pear", "plum", "cherry", "kiwi", "melon", "lemon",
    "lime", "fruit", "avocado",
];

/// Words that mark a food as vegetables
pub const VEGETABLE_KEYWORDS: &[&str] = &[
    "broccoli", "carrot", "spinach", "lettuce", "salad", "tomato", "cucumber", "pepper",
    "onion", "garlic", "cabbage", "kale", "zucchini", "mushroom", "celery", "asparagus",
    "cauliflower", "pea", "vegetable", "veggie", "greens", "eggplant", "aubergine", "squash",
    "pumpkin",
];

/// Words that mark a food as fats
pub const FAT_KEYWORDS: &[&str] = &[
    "oil", "nut", "almond", "walnut", "cashew", "peanut", "pecan", "pistachio", "hazelnut",
    "seed", "olive", "mayonnaise", "lard", "ghee",
];

/// Names that contain a dairy word without being dairy
///
/// Blanked out before the dairy rules and the dairy allergen are checked.
pub const NON_DAIRY_PHRASES: &[&str] = &[
    "peanut butter", "almond butter", "cashew butter", "nut butter", "cocoa butter",
    "apple butter", "coconut milk", "coconut cream", "almond milk", "soy milk", "oat milk",
    "rice milk",
];

/// Curated synonym expansions used when building search keywords
pub const SEARCH_SYNONYMS: &[(&str, &[&str])] = &[
    ("chicken", &["poultry"]),
    ("turkey", &["poultry"]),
    ("beef", &["steak", "meat"]),
    ("steak", &["beef"]),
    ("pork", &["meat"]),
    ("salmon", &["fish"]),
    ("tuna", &["fish"]),
    ("cod", &["fish"]),
    ("shrimp", &["prawn", "seafood"]),
    ("prawn", &["shrimp", "seafood"]),
    ("fries", &["potato"]),
    ("spaghetti", &["pasta"]),
    ("noodles", &["pasta"]),
    ("yoghurt", &["yogurt"]),
    ("yogurt", &["yoghurt"]),
    ("soda", &["soft drink"]),
];

/// Allergen categories and the name words that trigger them
pub const ALLERGEN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "nuts",
        &[
            "nut", "almond", "walnut", "cashew", "pecan", "pistachio", "hazelnut", "peanut",
            "macadamia", "praline",
        ],
    ),
    (
        "dairy",
        &[
            "milk", "cheese", "yogurt", "yoghurt", "cream", "butter", "whey", "casein", "latte",
            "mozzarella", "parmesan",
        ],
    ),
    (
        "gluten",
        &[
            "wheat", "bread", "pasta", "noodle", "spaghetti", "flour", "barley", "rye", "couscous",
            "bagel", "pizza", "cracker", "toast", "croissant", "bun",
        ],
    ),
    (
        "shellfish",
        &[
            "shrimp", "prawn", "crab", "lobster", "oyster", "mussel", "clam", "scallop",
            "crayfish",
        ],
    ),
    ("eggs", &["egg", "omelet", "omelette", "mayonnaise", "meringue"]),
    ("soy", &["soy", "tofu", "tempeh", "edamame", "miso"]),
];
