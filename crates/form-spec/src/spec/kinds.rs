use std::borrow::Cow;
use std::fmt;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};

/// Declares a closed set of wire strings that still round-trips values it
/// does not know about through an `Other` variant.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Value outside the known set, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Every recognised wire value, in declaration order.
            pub const KNOWN: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $text, )+
                    Self::Other(value) => value.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $( $text => Self::$variant, )+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> Cow<'static, str> {
                stringify!($name).into()
            }

            fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
                json_schema!({
                    "type": "string",
                    "examples": Self::KNOWN,
                })
            }
        }
    };
}

string_enum! {
    /// Input widget kinds a `<question type="...">` may declare.
    pub enum QuestionType {
        Char => "char",
        Text => "text",
        Ssn => "ssn",
        Radio => "radio",
        RadioSeparate => "radioseperate",
        Select => "select",
        Date => "date",
        Time => "time",
        EmpDateStart => "emp_date_start",
        EmpDateEnd => "emp_date_end",
        ResDateStart => "res_date_start",
        ResDateEnd => "res_date_end",
        State => "state",
        StateUbe => "state_ube",
        StateMutual => "state_mutual",
        Country => "country",
        County => "county",
        Zip => "zip",
        Lawschool => "lawschool",
        Examsite => "examsite",
        Signature => "signature",
        ProfileReference => "profilereference",
        ExamReference => "examreference",
        Notice => "notice",
    }
    default = Char;
}

impl QuestionType {
    /// Kinds rendered from a list of `<option>` children.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            QuestionType::Radio | QuestionType::RadioSeparate | QuestionType::Select
        )
    }
}

string_enum! {
    /// How a conditionset combines its trigger answers.
    pub enum ConditionOperator {
        And => "and",
        Or => "or",
        /// Date comparison in the legacy runtime; evaluated as `or` here.
        Smaller => "smaller",
        Switch => "switch",
        Contain => "contain",
        Else => "else",
    }
    default = And;
}

string_enum! {
    pub enum EntityType {
        Single => "single",
        AddMore => "addmore",
    }
    default = Single;
}

string_enum! {
    /// Applicant profile fields a `<reference>` can pull from.
    pub enum ProfileField {
        FullName => "fullname",
        Ssn => "ssn",
        Dob => "dob",
        PlaceOfBirth => "place_of_birth",
        Title => "title",
        NcbeNumber => "ncbe_number",
        Address1 => "address1",
        Address2 => "address2",
        City => "city",
        State => "state",
        Zip => "zip",
        County => "county",
        Country => "country",
        Email => "email",
        CellPhone => "cellphone",
        PrimaryPhone => "primaryphone",
        Fax => "fax",
        FirmName => "firmname",
        AddressType => "addresstype",
    }
    default = FullName;
}
