use crate::parser::Cell;

/// Label used for rows whose group cell is blank or missing.
pub const MISSING_GROUP: &str = "(none)";

/// Leniently reads a grade out of a roster cell.
///
/// Text is trimmed and stripped of thousands separators, percent signs and
/// inner whitespace before parsing, so `"1,250"`, `"72%"` and `" 64.5 "` all
/// parse. Anything non-numeric (including NaN/inf) yields `None`.
pub fn parse_grade(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Empty => return None,
        Cell::Number(n) => *n,
        Cell::Text(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| *c != ',' && *c != '%' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
    };

    value.is_finite().then_some(value)
}

/// Coerces a group cell into its display label.
pub fn group_label(cell: Option<&Cell>) -> String {
    match cell {
        Some(Cell::Text(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Some(Cell::Number(n)) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Some(Cell::Number(n)) => n.to_string(),
        _ => MISSING_GROUP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_parse_grade_numbers() {
        assert_eq!(parse_grade(&Cell::Number(88.5)), Some(88.5));
        assert_eq!(parse_grade(&Cell::Number(f64::NAN)), None);
        assert_eq!(parse_grade(&Cell::Empty), None);
    }

    #[test]
    fn test_parse_grade_lenient_text() {
        assert_eq!(parse_grade(&text("72%")), Some(72.0));
        assert_eq!(parse_grade(&text("1,250")), Some(1250.0));
        assert_eq!(parse_grade(&text(" 64.5 ")), Some(64.5));
        assert_eq!(parse_grade(&text("-3")), Some(-3.0));
    }

    #[test]
    fn test_parse_grade_rejects_non_numeric() {
        assert_eq!(parse_grade(&text("absent")), None);
        assert_eq!(parse_grade(&text("%")), None);
        assert_eq!(parse_grade(&text("")), None);
        assert_eq!(parse_grade(&text("inf")), None);
        assert_eq!(parse_grade(&text("12abc")), None);
    }

    #[test]
    fn test_group_label() {
        assert_eq!(group_label(Some(&text(" B "))), "B");
        assert_eq!(group_label(Some(&Cell::Number(3.0))), "3");
        assert_eq!(group_label(Some(&Cell::Number(2.5))), "2.5");
        assert_eq!(group_label(Some(&text("  "))), MISSING_GROUP);
        assert_eq!(group_label(Some(&Cell::Empty)), MISSING_GROUP);
        assert_eq!(group_label(None), MISSING_GROUP);
    }
}
