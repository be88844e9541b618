// src/common/images.rs

use std::borrow::Cow;

/// Built-in image names, indexed by their two-digit number minus one.
///
/// Localized Scratch projects send images as `NN_<translated name>`; the number
/// selects the firmware's English image name.
const IMAGE_NAMES: [&str; 33] = [
    "HAPPY",
    "SAD",
    "ANGRY",
    "SMILE",
    "HEART",
    "CONFUSED",
    "ASLEEP",
    "SURPRISED",
    "SILLY",
    "FABULOUS",
    "MEH",
    "YES",
    "NO",
    "TRIANGLE",
    "DIAMOND",
    "DIAMOND_SMALL",
    "SQUARE",
    "SQUARE_SMALL",
    "TARGET",
    "STICKFIGURE",
    "RABBIT",
    "COW",
    "ROLLERSKATE",
    "HOUSE",
    "SNAKE",
    "ARROW_N",
    "ARROW_NE",
    "ARROW_E",
    "ARROW_SE",
    "ARROW_S",
    "ARROW_SW",
    "ARROW_W",
    "ARROW_NW",
];

/// Resolves a numbered image name (`05_...`) to the firmware's image name.
///
/// Names without the `NN_` prefix, or with a number outside `01..=33`, are
/// returned unchanged.
pub fn translate_image_name(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let (Some(tens), Some(ones), Some('_')) = (chars.next(), chars.next(), chars.next()) else {
        return Cow::Borrowed(name);
    };
    let (Some(tens), Some(ones)) = (tens.to_digit(10), ones.to_digit(10)) else {
        return Cow::Borrowed(name);
    };

    match (tens * 10 + ones) as usize {
        index @ 1..=33 => Cow::Borrowed(IMAGE_NAMES[index - 1]),
        _ => Cow::Borrowed(name),
    }
}
