//! Shared domain enums
//!
//! Every enum is stored in the database as its short code (the same codes the
//! platform has always used, e.g. `UR` for "under review") and exchanged over
//! JSON as a snake_case name.

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Database code
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $code => Ok($name::$variant), )+
                    _ => Err(format!("Invalid {} code: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
            }
        }
    };
}

coded_enum! {
    /// Kind of account attached to a user profile
    pub enum UserType {
        Researcher => "R",
        Publisher => "P",
        Editor => "E",
    }
}

coded_enum! {
    /// Whether a journal accepts new submissions
    pub enum JournalStatus {
        Open => "O",
        Closed => "C",
    }
}

coded_enum! {
    /// Field of law a paper belongs to
    pub enum FieldOfLaw {
        /// Admiralty (Maritime) Law
        Admiralty => "A",
        /// Bankruptcy Law
        Bankruptcy => "B",
        /// Business (Corporate) Law
        Business => "BC",
        CivilProcedure => "CP",
        CivilRights => "CR",
        Constitutional => "CL",
        Contracts => "CO",
        Criminal => "C",
        CriminalProcedure => "CRP",
        DisputeResolution => "DR",
        Entertainment => "E",
        Environment => "EV",
        Family => "F",
        Health => "H",
        Immigration => "I",
        IntellectualProperty => "IP",
        International => "IN",
        /// Labor (Employment) Law
        Labor => "L",
        Military => "M",
        PersonalInjury => "PI",
        Property => "P",
        RealEstate => "RE",
        Tax => "T",
        Torts => "TO",
    }
}

coded_enum! {
    /// Ranking tier of the best offer a paper has received elsewhere
    pub enum RankingTier {
        Unranked => "-1",
        /// T-14
        Top14 => "14",
        /// T-25
        Top25 => "25",
        /// T-50
        Top50 => "50",
        /// T-100
        Top100 => "100",
        /// T-100+
        Beyond100 => "101",
    }
}

coded_enum! {
    pub enum PaperType {
        Article => "A",
        Essay => "E",
    }
}

coded_enum! {
    /// Final decision of a journal on a paper
    pub enum Offer {
        Accept => "A",
        Reject => "R",
    }
}

coded_enum! {
    /// Editor's decision whether to review a paper at all
    pub enum StartDecision {
        AcceptForReview => "A",
        DeclineToReview => "R",
    }
}

coded_enum! {
    /// Researcher's answer to an accepted offer
    pub enum OfferAccepted {
        Yes => "Y",
        No => "N",
    }
}

coded_enum! {
    /// Evaluation lifecycle
    pub enum EvaluationStatus {
        NotStarted => "N",
        UnderReview => "UR",
        UnderFullBoardReview => "UFR",
        Complete => "C",
    }
}

coded_enum! {
    /// Current academic or professional position of a researcher
    pub enum Position {
        Professor => "P",
        /// Post-Doc/Fellow
        PostDoc => "PD",
        /// Graduate (MA/MS/PhD) Student
        GraduateStudent => "GS",
        LawStudent => "LS",
        Undergraduate => "U",
        Practitioner => "PR",
        Judge => "J",
        Other => "O",
    }
}

impl EvaluationStatus {
    /// Under review by one editor or by the full board
    pub fn is_under_review(&self) -> bool {
        matches!(self, EvaluationStatus::UnderReview | EvaluationStatus::UnderFullBoardReview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_str() {
        assert_eq!("UFR".parse::<EvaluationStatus>(), Ok(EvaluationStatus::UnderFullBoardReview));
        assert_eq!("CRP".parse::<FieldOfLaw>(), Ok(FieldOfLaw::CriminalProcedure));
        assert_eq!("-1".parse::<RankingTier>(), Ok(RankingTier::Unranked));
        assert!("X".parse::<UserType>().is_err());
    }

    #[test]
    fn test_json_uses_snake_case_names() {
        let json = serde_json::to_string(&StartDecision::AcceptForReview).unwrap();
        assert_eq!(json, "\"accept_for_review\"");
        let parsed: UserType = serde_json::from_str("\"editor\"").unwrap();
        assert_eq!(parsed, UserType::Editor);
    }

    #[test]
    fn test_under_review() {
        assert!(EvaluationStatus::UnderReview.is_under_review());
        assert!(EvaluationStatus::UnderFullBoardReview.is_under_review());
        assert!(!EvaluationStatus::NotStarted.is_under_review());
        assert!(!EvaluationStatus::Complete.is_under_review());
    }
}
