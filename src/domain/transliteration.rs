//! Passport-style transliteration of name fields.
//!
//! Every character maps to upper-case unaccented Latin, a space, a hyphen,
//! or nothing at all. Cyrillic, Georgian, Hebrew and the Turkish-specific
//! Latin letters have explicit tables; anything else that is not already a
//! basic Latin letter is dropped.

/// Transliterates `input` into `A-Z`, space and hyphen only.
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        push_char(&mut out, ch);
    }
    out
}

fn push_char(out: &mut String, ch: char) {
    if ch.is_ascii_alphabetic() {
        out.push(ch.to_ascii_uppercase());
        return;
    }
    if ch == ' ' || ch == '-' {
        out.push(ch);
        return;
    }
    // Lower-casing İ yields "i\u{307}", which would otherwise be split.
    if ch == 'İ' {
        out.push('I');
        return;
    }
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    if lower.is_ascii_alphabetic() {
        out.push(lower.to_ascii_uppercase());
    } else if let Some(latin) = latin_for(lower) {
        out.push_str(latin);
    }
}

fn latin_for(ch: char) -> Option<&'static str> {
    cyrillic(ch)
        .or_else(|| georgian(ch))
        .or_else(|| hebrew(ch))
        .or_else(|| turkish(ch))
}

fn cyrillic(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "A",
        'б' => "B",
        'в' => "V",
        'г' => "G",
        'ґ' => "G",
        'д' => "D",
        'е' | 'ё' | 'э' => "E",
        'є' => "IE",
        'ж' => "ZH",
        'з' => "Z",
        'и' | 'і' | 'ї' | 'й' => "I",
        'к' => "K",
        'л' => "L",
        'м' => "M",
        'н' => "N",
        'о' => "O",
        'п' => "P",
        'р' => "R",
        'с' => "S",
        'т' => "T",
        'у' => "U",
        'ф' => "F",
        'х' => "KH",
        'ц' => "TS",
        'ч' => "CH",
        'ш' => "SH",
        'щ' => "SHCH",
        'ъ' => "IE",
        'ы' => "Y",
        'ь' => "",
        'ю' => "IU",
        'я' => "IA",
        _ => return None,
    };
    Some(latin)
}

fn georgian(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'ა' => "A",
        'ბ' => "B",
        'გ' => "G",
        'დ' => "D",
        'ე' => "E",
        'ვ' => "V",
        'ზ' => "Z",
        'თ' | 'ტ' => "T",
        'ი' => "I",
        'კ' | 'ქ' => "K",
        'ლ' => "L",
        'მ' => "M",
        'ნ' => "N",
        'ო' => "O",
        'პ' | 'ფ' => "P",
        'ჟ' => "ZH",
        'რ' => "R",
        'ს' => "S",
        'უ' => "U",
        'ღ' => "GH",
        'ყ' => "Q",
        'შ' => "SH",
        'ჩ' | 'ჭ' => "CH",
        'ც' | 'წ' => "TS",
        'ძ' => "DZ",
        'ხ' => "KH",
        'ჯ' => "J",
        'ჰ' => "H",
        _ => return None,
    };
    Some(latin)
}

fn hebrew(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'א' | 'ע' => "A",
        'ב' => "B",
        'ג' => "G",
        'ד' => "D",
        'ה' => "H",
        'ו' => "V",
        'ז' => "Z",
        'ח' => "KH",
        'ט' | 'ת' => "T",
        'י' => "Y",
        'כ' | 'ך' | 'ק' => "K",
        'ל' => "L",
        'מ' | 'ם' => "M",
        'נ' | 'ן' => "N",
        'ס' => "S",
        'פ' | 'ף' => "P",
        'צ' | 'ץ' => "TS",
        'ר' => "R",
        'ש' => "SH",
        _ => return None,
    };
    Some(latin)
}

fn turkish(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'ç' => "C",
        'ğ' => "G",
        'ı' | 'î' => "I",
        'ö' => "O",
        'ş' => "S",
        'ü' | 'û' => "U",
        'â' => "A",
        _ => return None,
    };
    Some(latin)
}
