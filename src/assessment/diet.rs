use serde::Serialize;

use super::classifier::RiskColor;

const HIGH_RISK_DOS: &[&str] = &[
    "Bitter Gourd (Kakarakaya)",
    "Fenugreek (Menthulu)",
    "Spinach & Amaranth (Thotakura)",
    "Cinnamon (Dalchina Chekka)",
    "Barley Water",
    "Garlic & Ginger",
    "Raw Vegetables (Salads)",
    "Flax Seeds (Avise Ginnalu)",
    "Nuts (Walnuts/Almonds)",
];

const HIGH_RISK_DONTS: &[&str] = &[
    "White Rice & Biryani",
    "Sweets & Jaggery",
    "Soft Drinks & Energy Drinks",
    "White Bread & Maida",
    "Deep Fried Foods (Bajjilu/Pukodi)",
    "Red Meat",
    "Full-fat Dairy",
    "Alcohol",
    "Artificial Sweeteners",
];

const MEDIUM_RISK_DOS: &[&str] = &[
    "Brown Rice / Millets (Korralu)",
    "Oats & Broken Wheat (Upma Rava)",
    "Sprouts (Molakalu)",
    "Guava & Papaya",
    "Curd & Buttermilk",
    "Beans & Lentils",
    "Boiled Eggs (White part)",
    "Green Tea",
    "Chia Seeds",
];

const MEDIUM_RISK_DONTS: &[&str] = &[
    "Potatoes & Yam (Kandagadda)",
    "Bakery Items (Cakes/Puffs)",
    "Excess Salt (Pickles)",
    "Honey & Dates",
    "Ice Creams",
    "Oily Curries",
    "Pizza & Burgers",
    "Mangoes & Grapes (Limit)",
    "Flavored Yogurts",
];

const LOW_RISK_DOS: &[&str] = &[
    "Whole Grains",
    "Fresh Fruits (Seasonal)",
    "Lean Protein (Fish/Chicken)",
    "Plenty of Water",
    "Low-fat Milk",
    "Seeds & Nuts",
    "Fiber-rich Veggies",
    "Herbal Tea",
    "Coconut Water",
];

const LOW_RISK_DONTS: &[&str] = &[
    "Junk Food",
    "Processed Meat",
    "Excess Sugar",
    "Too much Caffeine",
    "Salty Snacks (Chips)",
    "Late Night Heavy Meals",
    "Trans Fats",
    "Canned Juices",
];

/// 某一风险等级的推荐与忌口食物
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DietPlan {
    pub dos: &'static [&'static str],
    pub donts: &'static [&'static str],
}

impl DietPlan {
    pub fn for_color(color: RiskColor) -> Self {
        match color {
            RiskColor::Danger => DietPlan {
                dos: HIGH_RISK_DOS,
                donts: HIGH_RISK_DONTS,
            },
            RiskColor::Warning => DietPlan {
                dos: MEDIUM_RISK_DOS,
                donts: MEDIUM_RISK_DONTS,
            },
            RiskColor::Success => DietPlan {
                dos: LOW_RISK_DOS,
                donts: LOW_RISK_DONTS,
            },
        }
    }
}
