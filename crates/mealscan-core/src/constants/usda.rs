// ABOUTME: USDA FoodData Central nutrient identifiers and API defaults
// ABOUTME: Used to map FDC nutrient rows onto NutritionInfo fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// Default client-side cache TTL (24 hours)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Default request budget per minute
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;

/// Protein (g)
pub const NUTRIENT_PROTEIN: u32 = 1003;
/// Total lipid / fat (g)
pub const NUTRIENT_FAT: u32 = 1004;
/// Carbohydrate, by difference (g)
pub const NUTRIENT_CARBS: u32 = 1005;
/// Energy (kcal)
pub const NUTRIENT_ENERGY: u32 = 1008;
/// Fiber, total dietary (g)
pub const NUTRIENT_FIBER: u32 = 1079;
/// Sodium, Na (mg)
pub const NUTRIENT_SODIUM: u32 = 1093;
/// Sugars, total (g)
pub const NUTRIENT_SUGAR: u32 = 2000;

/// Minerals reported in the `minerals` map (id, display name)
pub const MINERALS: &[(u32, &str)] = &[
    (1087, "calcium_mg"),
    (1089, "iron_mg"),
    (1090, "magnesium_mg"),
    (1091, "phosphorus_mg"),
    (1092, "potassium_mg"),
    (1095, "zinc_mg"),
];

/// Vitamins reported in the `vitamins` map (id, display name)
pub const VITAMINS: &[(u32, &str)] = &[
    (1106, "vitamin_a_ug"),
    (1162, "vitamin_c_mg"),
    (1114, "vitamin_d_ug"),
    (1109, "vitamin_e_mg"),
    (1185, "vitamin_k_ug"),
    (1178, "vitamin_b12_ug"),
];
