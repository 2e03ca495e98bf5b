//! Каталог сущностей фермы
//!
//! Порядок в [`EXPORT_SECTIONS`] — это порядок секций в сводном экспорте.

use super::common::{DerivedFieldRule, EntitySchema, FieldDef};

/// Профиль фермы (метаданные экспорта, не секция)
pub static FARM: EntitySchema = EntitySchema {
    name: "farm",
    collection: "farms",
    title: "Farm information",
    farm_scoped: false,
    fields: &[
        FieldDef::text("name", "Farm name"),
        FieldDef::text("location", "Location"),
        FieldDef::number("area_hectares", "Area (ha)"),
        FieldDef::text("farm_type", "Farm type"),
        FieldDef::text("registration_number", "Registration number"),
        FieldDef::date("established", "Established"),
    ],
    required: &["name"],
    derived: None,
    date_field: None,
    sort_key: "created",
    expand: &[],
    category_field: None,
};

/// Потребление воды; total = питьевая + мойка + привозная
pub static WATER_CONSUMPTION: EntitySchema = EntitySchema {
    name: "water_consumption",
    collection: "water_consumption",
    title: "Water consumption",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::number("drinking", "Drinking water (m3)"),
        FieldDef::number("cleaning", "Cleaning water (m3)"),
        FieldDef::number("delivered", "Delivered water (m3)"),
        FieldDef::number("total", "Total (m3)"),
        FieldDef::text("source", "Source"),
        FieldDef::text("notes", "Notes"),
    ],
    required: &["date"],
    derived: Some(DerivedFieldRule {
        target: "total",
        sources: &["drinking", "cleaning", "delivered"],
    }),
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("source"),
};

/// Потребление электроэнергии; total_kwh = день + ночь
pub static ELECTRICITY_CONSUMPTION: EntitySchema = EntitySchema {
    name: "electricity_consumption",
    collection: "electricity_consumption",
    title: "Electricity consumption",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::number("meter_reading", "Meter reading"),
        FieldDef::number("day_kwh", "Day tariff (kWh)"),
        FieldDef::number("night_kwh", "Night tariff (kWh)"),
        FieldDef::number("total_kwh", "Total (kWh)"),
        FieldDef::number("cost", "Cost"),
        FieldDef::text("notes", "Notes"),
    ],
    required: &["date"],
    derived: Some(DerivedFieldRule {
        target: "total_kwh",
        sources: &["day_kwh", "night_kwh"],
    }),
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: None,
};

pub static FUEL_INTAKE: EntitySchema = EntitySchema {
    name: "fuel_intake",
    collection: "fuel_entries",
    title: "Fuel intake",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date received"),
        FieldDef::text("fuel_type", "Fuel type"),
        FieldDef::number("quantity_liters", "Quantity (l)"),
        FieldDef::number("price_per_liter", "Price per liter"),
        FieldDef::number("total_cost", "Total cost"),
        FieldDef::text("supplier", "Supplier"),
        FieldDef::text("invoice_number", "Invoice number"),
    ],
    required: &["date", "fuel_type", "quantity_liters"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("fuel_type"),
};

pub static FEED_DELIVERIES: EntitySchema = EntitySchema {
    name: "feed_deliveries",
    collection: "feed_deliveries",
    title: "Feed deliveries",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Delivery date"),
        FieldDef::text("feed_type", "Feed type"),
        FieldDef::number("quantity_kg", "Quantity (kg)"),
        FieldDef::text("supplier", "Supplier"),
        FieldDef::text("batch_number", "Batch number"),
        FieldDef::number("cost", "Cost"),
    ],
    required: &["date", "feed_type", "quantity_kg"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("feed_type"),
};

pub static FEED_CONSUMPTION: EntitySchema = EntitySchema {
    name: "feed_consumption",
    collection: "feed_consumption",
    title: "Feed consumption",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("feed_type", "Feed type"),
        FieldDef::number("quantity_kg", "Quantity (kg)"),
        FieldDef::text("animal_group", "Animal group"),
        FieldDef::text("building", "Building"),
    ],
    required: &["date", "feed_type", "quantity_kg"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("animal_group"),
};

pub static ANIMAL_INVENTORY: EntitySchema = EntitySchema {
    name: "animal_inventory",
    collection: "animal_inventory",
    title: "Animal inventory",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Count date"),
        FieldDef::text("species", "Species"),
        FieldDef::text("breed", "Breed"),
        FieldDef::number("head_count", "Head count"),
        FieldDef::text("building", "Building"),
        FieldDef::text("notes", "Notes"),
    ],
    required: &["date", "species", "head_count"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("species"),
};

pub static ANIMAL_MORTALITY: EntitySchema = EntitySchema {
    name: "animal_mortality",
    collection: "mortality",
    title: "Animal mortality",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("species", "Species"),
        FieldDef::number("count", "Head count"),
        FieldDef::text("cause", "Cause"),
        FieldDef::text("building", "Building"),
        FieldDef::text("disposal_method", "Disposal method"),
        FieldDef::relation("reported_by", "Reported by"),
    ],
    required: &["date", "species", "count"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &["reported_by"],
    category_field: Some("cause"),
};

pub static ANIMAL_PURCHASES: EntitySchema = EntitySchema {
    name: "animal_purchases",
    collection: "animal_purchases",
    title: "Animal purchases",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Purchase date"),
        FieldDef::text("species", "Species"),
        FieldDef::number("count", "Head count"),
        FieldDef::text("supplier", "Supplier"),
        FieldDef::number("unit_price", "Unit price"),
        FieldDef::number("total_price", "Total price"),
    ],
    required: &["date", "species", "count"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("species"),
};

pub static ANIMAL_SALES: EntitySchema = EntitySchema {
    name: "animal_sales",
    collection: "animal_sales",
    title: "Animal sales",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Sale date"),
        FieldDef::text("species", "Species"),
        FieldDef::number("count", "Head count"),
        FieldDef::text("buyer", "Buyer"),
        FieldDef::number("total_weight_kg", "Total weight (kg)"),
        FieldDef::number("total_price", "Total price"),
    ],
    required: &["date", "species", "count"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("buyer"),
};

pub static VACCINATIONS: EntitySchema = EntitySchema {
    name: "vaccinations",
    collection: "vaccinations",
    title: "Vaccinations",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("vaccine", "Vaccine"),
        FieldDef::text("species", "Species"),
        FieldDef::number("animals_treated", "Animals treated"),
        FieldDef::text("batch_number", "Batch number"),
        FieldDef::relation("administered_by", "Administered by"),
    ],
    required: &["date", "vaccine"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &["administered_by"],
    category_field: Some("vaccine"),
};

pub static MEDICATIONS: EntitySchema = EntitySchema {
    name: "medications",
    collection: "medications",
    title: "Medications",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("medication", "Medication"),
        FieldDef::text("dosage", "Dosage"),
        FieldDef::number("animals_treated", "Animals treated"),
        FieldDef::number("withdrawal_days", "Withdrawal period (days)"),
        FieldDef::relation("prescribed_by", "Prescribed by"),
    ],
    required: &["date", "medication"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &["prescribed_by"],
    category_field: Some("medication"),
};

pub static VETERINARY_VISITS: EntitySchema = EntitySchema {
    name: "veterinary_visits",
    collection: "veterinary_visits",
    title: "Veterinary visits",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Visit date"),
        FieldDef::relation("veterinarian", "Veterinarian"),
        FieldDef::text("reason", "Reason"),
        FieldDef::text("findings", "Findings"),
        FieldDef::number("cost", "Cost"),
    ],
    required: &["date", "reason"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &["veterinarian"],
    category_field: Some("reason"),
};

pub static VETERINARY_STAFF: EntitySchema = EntitySchema {
    name: "veterinary_staff",
    collection: "veterinary_staff",
    title: "Veterinary staff",
    farm_scoped: true,
    fields: &[
        FieldDef::text("full_name", "Full name"),
        FieldDef::text("role", "Role"),
        FieldDef::text("phone", "Phone"),
        FieldDef::text("email", "Email"),
        FieldDef::text("license_number", "License number"),
        FieldDef::boolean("active", "Active"),
    ],
    required: &["full_name", "role"],
    derived: None,
    date_field: None,
    sort_key: "created",
    expand: &[],
    category_field: Some("role"),
};

pub static EMPLOYEES: EntitySchema = EntitySchema {
    name: "employees",
    collection: "employees",
    title: "Employees",
    farm_scoped: true,
    fields: &[
        FieldDef::text("full_name", "Full name"),
        FieldDef::text("position", "Position"),
        FieldDef::text("phone", "Phone"),
        FieldDef::date("hire_date", "Hire date"),
        FieldDef::boolean("active", "Active"),
    ],
    required: &["full_name", "position"],
    derived: None,
    date_field: None,
    sort_key: "created",
    expand: &[],
    category_field: Some("position"),
};

pub static EGG_PRODUCTION: EntitySchema = EntitySchema {
    name: "egg_production",
    collection: "egg_production",
    title: "Egg production",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("building", "Building"),
        FieldDef::number("eggs_collected", "Eggs collected"),
        FieldDef::number("eggs_broken", "Eggs broken"),
        FieldDef::number("eggs_sold", "Eggs sold"),
    ],
    required: &["date", "eggs_collected"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("building"),
};

pub static MILK_PRODUCTION: EntitySchema = EntitySchema {
    name: "milk_production",
    collection: "milk_production",
    title: "Milk production",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::number("liters", "Liters"),
        FieldDef::number("animals_milked", "Animals milked"),
        FieldDef::number("fat_percent", "Fat (%)"),
        FieldDef::text("buyer", "Buyer"),
    ],
    required: &["date", "liters"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("buyer"),
};

pub static WASTE_MANAGEMENT: EntitySchema = EntitySchema {
    name: "waste_management",
    collection: "waste_management",
    title: "Waste management",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("waste_type", "Waste type"),
        FieldDef::number("quantity_kg", "Quantity (kg)"),
        FieldDef::text("disposal_method", "Disposal method"),
        FieldDef::text("contractor", "Contractor"),
    ],
    required: &["date", "waste_type", "quantity_kg"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("waste_type"),
};

pub static EQUIPMENT_MAINTENANCE: EntitySchema = EntitySchema {
    name: "equipment_maintenance",
    collection: "equipment_maintenance",
    title: "Equipment maintenance",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("equipment", "Equipment"),
        FieldDef::text("maintenance_type", "Maintenance type"),
        FieldDef::number("cost", "Cost"),
        FieldDef::text("performed_by", "Performed by"),
        FieldDef::date("next_due", "Next due"),
    ],
    required: &["date", "equipment"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("equipment"),
};

pub static CLEANING_DISINFECTION: EntitySchema = EntitySchema {
    name: "cleaning_disinfection",
    collection: "cleaning_disinfection",
    title: "Cleaning and disinfection",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("area", "Area"),
        FieldDef::text("product", "Product"),
        FieldDef::number("quantity_liters", "Quantity (l)"),
        FieldDef::text("performed_by", "Performed by"),
    ],
    required: &["date", "area"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("area"),
};

pub static VISITOR_LOG: EntitySchema = EntitySchema {
    name: "visitor_log",
    collection: "visitor_log",
    title: "Visitor log",
    farm_scoped: true,
    fields: &[
        FieldDef::date("date", "Date"),
        FieldDef::text("visitor_name", "Visitor"),
        FieldDef::text("company", "Company"),
        FieldDef::text("purpose", "Purpose"),
        FieldDef::text("vehicle_plate", "Vehicle plate"),
        FieldDef::boolean("disinfected", "Disinfected"),
    ],
    required: &["date", "visitor_name"],
    derived: None,
    date_field: Some("date"),
    sort_key: "date",
    expand: &[],
    category_field: Some("company"),
};

/// Секции сводного экспорта, в порядке вывода
pub static EXPORT_SECTIONS: [&EntitySchema; 20] = [
    &WATER_CONSUMPTION,
    &ELECTRICITY_CONSUMPTION,
    &FUEL_INTAKE,
    &FEED_DELIVERIES,
    &FEED_CONSUMPTION,
    &ANIMAL_INVENTORY,
    &ANIMAL_MORTALITY,
    &ANIMAL_PURCHASES,
    &ANIMAL_SALES,
    &VACCINATIONS,
    &MEDICATIONS,
    &VETERINARY_VISITS,
    &VETERINARY_STAFF,
    &EMPLOYEES,
    &EGG_PRODUCTION,
    &MILK_PRODUCTION,
    &WASTE_MANAGEMENT,
    &EQUIPMENT_MAINTENANCE,
    &CLEANING_DISINFECTION,
    &VISITOR_LOG,
];

/// Все схемы: профиль фермы и секции
pub fn all_schemas() -> impl Iterator<Item = &'static EntitySchema> {
    std::iter::once(&FARM).chain(EXPORT_SECTIONS.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::FieldKind;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_collections_unique() {
        let names: HashSet<_> = all_schemas().map(|s| s.name).collect();
        let collections: HashSet<_> = all_schemas().map(|s| s.collection).collect();
        assert_eq!(names.len(), 21);
        assert_eq!(collections.len(), 21);
    }

    #[test]
    fn test_schema_references_are_declared() {
        for schema in all_schemas() {
            for name in schema.required {
                assert!(schema.field(name).is_some(), "{}: {}", schema.name, name);
            }
            if let Some(date) = schema.date_field {
                assert_eq!(schema.field(date).map(|f| f.kind), Some(FieldKind::Date));
            }
            if let Some(category) = schema.category_field {
                assert!(schema.field(category).is_some(), "{}: {}", schema.name, category);
            }
            for name in schema.expand {
                assert_eq!(schema.field(name).map(|f| f.kind), Some(FieldKind::Relation));
            }
            if let Some(rule) = schema.derived {
                assert_eq!(schema.field(rule.target).map(|f| f.kind), Some(FieldKind::Number));
                for source in rule.sources {
                    assert_eq!(schema.field(source).map(|f| f.kind), Some(FieldKind::Number));
                }
            }
            assert!(schema.is_filterable(schema.sort_key));
        }
    }
}
