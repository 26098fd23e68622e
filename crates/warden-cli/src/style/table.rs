//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use super::colors::SemanticStyle;

/// Creates a styled table with a bold header row.
pub fn styled_table(columns: &[&str], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    table
}

/// Prints rows as a formatted table with a count footer.
pub fn print_table(columns: &[&str], rows: &[Vec<String>], noun: &str) {
    if rows.is_empty() {
        println!("{}", format!("No {} declared.", plural(noun)).muted());
        return;
    }

    let table = styled_table(columns, rows);
    println!("{table}");

    let count = rows.len();
    let word = if count == 1 {
        noun.to_string()
    } else {
        plural(noun)
    };
    println!("{}", format!("({count} {word})").muted());
}

fn plural(noun: &str) -> String {
    match noun.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural("policy"), "policies");
        assert_eq!(plural("rule"), "rules");
    }

    #[test]
    fn test_styled_table_rows() {
        super::super::set_no_color(true);
        let table = styled_table(&["Policy", "Kind"], &[vec!["reports".into(), "rule".into()]]);
        let rendered = table.to_string();

        assert!(rendered.contains("Policy"));
        assert!(rendered.contains("reports"));
    }
}
