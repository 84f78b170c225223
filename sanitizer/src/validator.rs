use common::config::sanitizer_pack::Validator;

/// Discards matches that fail their declared validator (spec.md §4.1
/// step 2). Only `luhn` is defined by the wire format today.
pub fn passes(validator: Validator, candidate: &str) -> bool {
    match validator {
        Validator::Luhn => luhn_valid(candidate),
    }
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 2 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}
