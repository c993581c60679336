use crate::models::table::Value;

/// Label used for course codes missing from the catalogue
pub const UNKNOWN_COURSE: &str = "Unknown";

/// Course name for a numeric course code
pub fn course_name(code: i64) -> Option<&'static str> {
    let name = match code {
        33 => "Biofuel Production Technologies",
        171 => "Animation and Multimedia Design",
        8014 => "Social Service (evening)",
        9003 => "Agronomy",
        9070 => "Communication Design",
        9085 => "Veterinary Nursing",
        9119 => "Informatics Engineering",
        9130 => "Equinculture",
        9147 => "Management",
        9238 => "Social Service",
        9254 => "Tourism",
        9500 => "Nursing",
        9556 => "Oral Hygiene",
        9670 => "Advertising and Marketing Management",
        9773 => "Journalism and Communication",
        9853 => "Basic Education",
        9991 => "Management (evening)",
        _ => return None,
    };
    Some(name)
}

/// Course name for a raw `Course` cell, or [`UNKNOWN_COURSE`]
pub fn course_label(value: Option<&Value>) -> &'static str {
    value
        .and_then(Value::as_f64)
        .filter(|code| code.fract() == 0.0)
        .and_then(|code| course_name(code as i64))
        .unwrap_or(UNKNOWN_COURSE)
}
