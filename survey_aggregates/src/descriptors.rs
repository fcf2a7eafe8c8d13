// The fixed field sets of the coffee consumption survey.
// They are configuration, not derived from the data: every entry is emitted
// even when no respondent answered it.

use crate::config::FieldDescriptor;

pub const AGE_GROUP: &str = "age_group";
pub const COUNTRY: &str = "country";
pub const INTEREST_WELLNESS: &str = "interest_wellness";
pub const CUPS_PER_DAY: &str = "cups_per_day";
pub const BREWING_METHOD: &str = "brewing_method";
pub const ROAST_PREFERENCE: &str = "roast_preference";

/// Time-of-day slots. The first one gates the whole group (see `timing_average`).
pub const TIMING_SLOTS: [FieldDescriptor; 5] = [
    FieldDescriptor::new("morning_before_8", "Before 8am"),
    FieldDescriptor::new("morning_8_11", "8am-11am"),
    FieldDescriptor::new("lunch_11_1", "11am-1pm"),
    FieldDescriptor::new("afternoon_1_5", "1pm-5pm"),
    FieldDescriptor::new("evening_after_5", "After 5pm"),
];

pub const PURCHASE_FACTORS: [FieldDescriptor; 9] = [
    FieldDescriptor::new("factor_taste", "Taste"),
    FieldDescriptor::new("factor_price", "Price"),
    FieldDescriptor::new("factor_origin", "Origin"),
    FieldDescriptor::new("factor_organic", "Organic"),
    FieldDescriptor::new("factor_sustainability", "Sustainability"),
    FieldDescriptor::new("factor_brand", "Brand"),
    FieldDescriptor::new("factor_packaging", "Packaging"),
    FieldDescriptor::new("factor_health", "Health"),
    FieldDescriptor::new("factor_recommendations", "Recommendations"),
];

pub const ADDITIVES: [FieldDescriptor; 7] = [
    FieldDescriptor::new("add_nothing", "Nothing"),
    FieldDescriptor::new("add_milk", "Milk"),
    FieldDescriptor::new("add_plant_milk", "Plant Milk"),
    FieldDescriptor::new("add_sugar", "Sugar"),
    FieldDescriptor::new("add_artificial_sweetener", "Artificial Sweetener"),
    FieldDescriptor::new("add_honey", "Honey"),
    FieldDescriptor::new("add_syrup", "Syrup"),
];

/// Rankings, lower is preferred.
pub const LOCATIONS: [FieldDescriptor; 5] = [
    FieldDescriptor::new("rank_home", "Home"),
    FieldDescriptor::new("rank_work", "Work"),
    FieldDescriptor::new("rank_cafe", "Cafe"),
    FieldDescriptor::new("rank_restaurant", "Restaurant"),
    FieldDescriptor::new("rank_on_the_go", "On the go"),
];

pub const AWARENESS: [FieldDescriptor; 6] = [
    FieldDescriptor::new("aware_antioxidant", "Antioxidants"),
    FieldDescriptor::new("aware_alertness", "Alertness & Focus"),
    FieldDescriptor::new("aware_disease_risk", "Reduced Disease Risk"),
    FieldDescriptor::new("aware_athletic", "Athletic Performance"),
    FieldDescriptor::new("aware_metabolic", "Metabolic Health"),
    FieldDescriptor::new("aware_none", "No Benefits Aware Of"),
];

pub const TRY_FACTORS: [FieldDescriptor; 7] = [
    FieldDescriptor::new("try_lighter_roast", "Lighter Roast"),
    FieldDescriptor::new("try_partnership", "Brand Partnership"),
    FieldDescriptor::new("try_sustainability", "Sustainability"),
    FieldDescriptor::new("try_story", "Brand Story"),
    FieldDescriptor::new("try_wellness", "Wellness Benefits"),
    FieldDescriptor::new("try_availability", "Availability"),
    FieldDescriptor::new("try_recommendations", "Recommendations"),
];

pub const WOW_FACTORS: [FieldDescriptor; 7] = [
    FieldDescriptor::new("wow_scientific", "Scientific Background"),
    FieldDescriptor::new("wow_formulations", "Special Formulations"),
    FieldDescriptor::new("wow_packaging", "Packaging"),
    FieldDescriptor::new("wow_portuguese_nordic", "Portuguese-Nordic Fusion"),
    FieldDescriptor::new("wow_active", "Active Lifestyle Focus"),
    FieldDescriptor::new("wow_temperature", "Temperature Options"),
    FieldDescriptor::new("wow_functional", "Functional Benefits"),
];

pub const AGE_GROUPS: [&str; 6] = ["18-24", "25-34", "35-44", "45-54", "55-64", "65+"];

pub const ROAST_TYPES: [&str; 5] = ["light", "medium", "dark", "not sure", "no preference"];

/// Every column read by `aggregate_survey`, in a stable order.
pub fn all_field_keys() -> Vec<&'static str> {
    let mut keys = vec![
        AGE_GROUP,
        COUNTRY,
        INTEREST_WELLNESS,
        CUPS_PER_DAY,
        BREWING_METHOD,
        ROAST_PREFERENCE,
    ];
    for group in [
        &TIMING_SLOTS[..],
        &PURCHASE_FACTORS[..],
        &ADDITIVES[..],
        &LOCATIONS[..],
        &AWARENESS[..],
        &TRY_FACTORS[..],
        &WOW_FACTORS[..],
    ] {
        keys.extend(group.iter().map(|d| d.key));
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn field_keys_are_unique() {
        let keys = all_field_keys();
        let unique: HashSet<&str> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(keys.len(), 6 + 5 + 9 + 7 + 5 + 6 + 7 + 7);
    }
}
