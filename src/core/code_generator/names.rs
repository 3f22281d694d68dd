//! Identifier rewriting, temporary names and the built-in function/constant tables.

use std::cell::Cell;

use crate::core::code_generator::scope::ScopeContext;

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class", "const",
    "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event", "explicit", "extern",
    "false", "finally", "fixed", "float", "for", "foreach", "goto", "if", "implicit", "in", "int", "interface",
    "internal", "is", "lock", "long", "namespace", "new", "null", "object", "operator", "out", "override",
    "params", "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true", "try", "typeof",
    "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

/// Lower-cases a source name and escapes C# keywords.
pub fn rewrite_name(name: &str) -> String {
    let lower = name.to_lowercase();
    if CSHARP_KEYWORDS.contains(&lower.as_str()) {
        format!("@{}", lower)
    } else {
        lower
    }
}

/// Per-run counter behind `retVal1`, `errOn2`, `v3` ... Shared by every prefix, so no
/// two temporaries in one translation ever get the same number.
#[derive(Debug, Default)]
pub struct TempNameGenerator {
    counter: Cell<usize>,
}

impl TempNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, prefix: &str, scope: &ScopeContext) -> String {
        loop {
            let n = self.counter.get() + 1;
            self.counter.set(n);
            let candidate = format!("{}{}", prefix, n);
            if !scope.is_declared(&candidate) {
                return candidate;
            }
        }
    }
}

const BUILTIN_FUNCTIONS: &[&str] = &[
    "Abs", "Array", "Asc", "AscB", "AscW", "Atn", "CBool", "CByte", "CCur", "CDate", "CDbl", "Chr", "ChrB",
    "ChrW", "CInt", "CLng", "Cos", "CreateObject", "CSng", "CStr", "Date", "DateAdd", "DateDiff", "DatePart",
    "DateSerial", "DateValue", "Day", "Escape", "Eval", "Exp", "Filter", "Fix", "FormatCurrency",
    "FormatDateTime", "FormatNumber", "FormatPercent", "GetObject", "GetRef", "Hex", "Hour", "InputBox",
    "InStr", "InStrB", "InStrRev", "Int", "IsArray", "IsDate", "IsEmpty", "IsNull", "IsNumeric", "IsObject",
    "Join", "LBound", "LCase", "Left", "LeftB", "Len", "LenB", "Log", "LTrim", "Mid", "MidB", "Minute",
    "Month", "MonthName", "MsgBox", "Now", "Oct", "Replace", "RGB", "Right", "RightB", "Rnd", "Round",
    "RTrim", "ScriptEngine", "ScriptEngineBuildVersion", "ScriptEngineMajorVersion",
    "ScriptEngineMinorVersion", "Second", "Sgn", "Sin", "Space", "Split", "Sqr", "StrComp", "String",
    "StrReverse", "Tan", "Time", "Timer", "TimeSerial", "TimeValue", "Trim", "TypeName", "UBound", "UCase",
    "Unescape", "VarType", "Weekday", "WeekdayName", "Year",
];

const BUILTIN_CONSTANTS: &[&str] = &[
    "vbCrLf", "vbCr", "vbLf", "vbNewLine", "vbNullChar", "vbNullString", "vbTab", "vbVerticalTab",
    "vbFormFeed", "vbBack", "vbObjectError", "vbTrue", "vbFalse", "vbUseDefault", "vbBinaryCompare",
    "vbTextCompare", "vbEmpty", "vbNull", "vbInteger", "vbLong", "vbSingle", "vbDouble", "vbCurrency",
    "vbDate", "vbString", "vbObject", "vbError", "vbBoolean", "vbVariant", "vbDataObject", "vbDecimal",
    "vbByte", "vbArray", "vbSunday", "vbMonday", "vbTuesday", "vbWednesday", "vbThursday", "vbFriday",
    "vbSaturday", "vbUseSystemDayOfWeek", "vbFirstJan1", "vbFirstFourDays", "vbFirstFullWeek",
    "vbGeneralDate", "vbLongDate", "vbShortDate", "vbLongTime", "vbShortTime", "vbOKOnly", "vbOKCancel",
    "vbAbortRetryIgnore", "vbYesNoCancel", "vbYesNo", "vbRetryCancel", "vbCritical", "vbQuestion",
    "vbExclamation", "vbInformation", "vbDefaultButton1", "vbDefaultButton2", "vbDefaultButton3",
    "vbDefaultButton4", "vbApplicationModal", "vbSystemModal", "vbOK", "vbCancel", "vbAbort", "vbRetry",
    "vbIgnore", "vbYes", "vbNo",
];

/// Runtime member implementing a built-in function (`TypeName` -> `TYPENAME`).
pub fn builtin_function(name: &str) -> Option<String> {
    BUILTIN_FUNCTIONS
        .iter()
        .find(|f| f.eq_ignore_ascii_case(name))
        .map(|f| f.to_uppercase())
}

/// Canonical spelling of a built-in constant.
pub fn builtin_constant(name: &str) -> Option<&'static str> {
    BUILTIN_CONSTANTS.iter().copied().find(|c| c.eq_ignore_ascii_case(name))
}

/// Escapes text for a C# regular string literal (without the surrounding quotes).
pub fn escape_csharp(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}

pub fn string_literal(text: &str) -> String {
    format!("\"{}\"", escape_csharp(text))
}

/// Numeric literal as a typed C# value: `(Int16)1`, `(Int32)40000`, `(Int16)(-1)`, `1.5`,
/// integers beyond Int32 become doubles.
pub fn numeric_literal(content: &str) -> String {
    let (negative, digits) = match content.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, content),
    };
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(value) = content.parse::<i64>() {
            let (cast, fits) = if i16::try_from(value).is_ok() {
                ("Int16", true)
            } else if i32::try_from(value).is_ok() {
                ("Int32", true)
            } else {
                ("", false)
            };
            if fits {
                return if negative {
                    format!("({})({})", cast, value)
                } else {
                    format!("({}){}", cast, value)
                };
            }
        }
        let trimmed = digits.trim_start_matches('0');
        let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
        return if negative { format!("(-{}D)", trimmed) } else { format!("{}D", trimmed) };
    }
    if negative {
        format!("({})", content)
    } else {
        content.to_string()
    }
}
