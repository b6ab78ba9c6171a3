/// Formats a coordinate as plain decimal text for a content stream.
///
/// The value is printed with its shortest exact decimal form (never in
/// exponent notation), trailing fractional zeros are dropped, and integral
/// values keep a single `.0`.
pub fn format_coordinate(value: f32) -> String {
    // -0.0 prints as 0.0
    let value = if value == 0.0 { 0.0 } else { value };
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
        return text;
    }
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text
}
