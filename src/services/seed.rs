use crate::models::DocumentId;

const PLACEHOLDER_MENU: &str = "Menu to be announced";

/// Sample menus the store starts with, one per weekday.
pub fn weekday_menus() -> Vec<(DocumentId, String)> {
    crate::models::weekday_documents()
        .into_iter()
        .map(|id| {
            let content = initial_content(&id);
            (id, content)
        })
        .collect()
}

/// Seed content for a document key; unknown keys get a placeholder so
/// every managed document has a stored entry.
pub fn initial_content(id: &DocumentId) -> String {
    match id.as_str() {
        "MONDAY" => render(
            &["Soup of the Day", "House Salad", "Garlic Bread"],
            &["Grilled Chicken with Vegetables", "Vegetable Pasta Primavera"],
            &["Chocolate Cake", "Fresh Fruit Plate"],
            Some("Gluten-free options available upon request"),
        ),
        "TUESDAY" => render(
            &["Caesar Salad", "Bruschetta"],
            &["Beef Steak with Mashed Potatoes", "Grilled Salmon Fillet"],
            &["Tiramisu", "Vanilla Ice Cream"],
            None,
        ),
        "WEDNESDAY" => render(
            &["Caprese Salad", "Antipasto Platter"],
            &["Spaghetti Carbonara", "Eggplant Parmesan"],
            &["Cannoli", "Panna Cotta"],
            Some("Italian night, all pasta made fresh daily"),
        ),
        "THURSDAY" => render(
            &["Shrimp Cocktail", "Clam Chowder"],
            &["Lobster Thermidor", "Grilled Sea Bass"],
            &["Key Lime Pie", "Bread Pudding"],
            None,
        ),
        "FRIDAY" => render(
            &["Fried Calamari", "Spinach Artichoke Dip"],
            &["Filet Mignon", "Chicken Marsala"],
            &["Cheesecake", "Chocolate Mousse"],
            None,
        ),
        "SATURDAY" => render(
            &["Fresh Fruit Platter", "Yogurt Parfait"],
            &["Eggs Benedict", "Steak and Eggs", "Belgian Waffles"],
            &["French Toast", "Cinnamon Rolls"],
            Some("Brunch, 10am to 2pm only"),
        ),
        "SUNDAY" => render(
            &["French Onion Soup", "Stuffed Mushrooms"],
            &["Roast Turkey with Gravy", "Pot Roast", "Baked Ham"],
            &["Apple Pie", "Pumpkin Pie"],
            Some("Family dinner, all you can eat"),
        ),
        _ => PLACEHOLDER_MENU.to_string(),
    }
}

fn render(appetizers: &[&str], mains: &[&str], desserts: &[&str], notes: Option<&str>) -> String {
    let mut lines = vec![
        format!("Appetizers: {}", appetizers.join(", ")),
        format!("Main courses: {}", mains.join(", ")),
        format!("Desserts: {}", desserts.join(", ")),
    ];
    if let Some(notes) = notes {
        lines.push(format!("Notes: {}", notes));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekdays_get_distinct_menus() {
        let menus = weekday_menus();
        assert_eq!(menus.len(), 7);
        assert!(menus[0].1.starts_with("Appetizers: Soup of the Day"));
        assert_ne!(menus[0].1, menus[1].1);
    }

    #[test]
    fn unknown_keys_get_placeholder() {
        assert_eq!(initial_content(&DocumentId::from("HOLIDAY")), PLACEHOLDER_MENU);
    }
}
