//! Canonical-key / alias-set resolution
//!
//! The alias table maps a canonical domain field name to the set of label
//! variations that mean the same thing, so the user-data record can stay
//! clean while forms use whatever vocabulary they like. The table is an
//! immutable injected value; [`AliasTable::builtin`] returns the shipped
//! dictionary covering names, contact info, addresses, dates of birth,
//! education, employment, references, EEO and documents.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Score for a direct canonical-to-alias match.
pub const CANONICAL_ALIAS_SCORE: f32 = 0.98;
/// Score when both sides are aliases of the same canonical term.
pub const SIBLING_ALIAS_SCORE: f32 = 0.95;

/// Immutable canonical-key to alias-set lookup table.
///
/// Keys and aliases are stored in normalized form (lowercase alphanumeric).
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    map: BTreeMap<String, Vec<String>>,
}

static BUILTIN: Lazy<AliasTable> = Lazy::new(|| {
    let entries: &[(&str, &[&str])] = &[
        // Name fields
        ("fullname", &["name", "completename", "legalname"]),
        ("firstname", &["first", "given", "forename", "fname", "givenname"]),
        ("lastname", &["last", "surname", "family", "lname", "familyname"]),
        ("middlename", &["middle", "mname", "middleinitial"]),
        // Contact
        ("email", &["emailaddress", "mail", "emailid"]),
        (
            "phonenumber",
            &[
                "phone", "mobile", "telephone", "contact", "cell", "cellphone", "contactnumber",
                "mobilenumber", "telephonenumber",
            ],
        ),
        (
            "alternatephone",
            &[
                "alternate", "secondary", "secondaryphone", "alternatenumber", "secondarynumber",
                "homephone", "otherphone",
            ],
        ),
        // Address
        (
            "addressstreet",
            &["address", "street", "addressline1", "address1", "streetaddress", "line1"],
        ),
        (
            "addressline2",
            &["address2", "apartment", "apt", "suite", "unit", "line2"],
        ),
        ("addresscity", &["city", "town", "locality"]),
        (
            "addressstate",
            &["state", "province", "region", "county", "stateprovince"],
        ),
        (
            "addresspostalcode",
            &["zip", "zipcode", "postal", "postcode", "postalcode"],
        ),
        ("addresscountry", &["country", "nation"]),
        // Date of birth
        ("dateofbirth", &["dob", "birthdate", "birthday", "birth", "bdate"]),
        (
            "dateofbirthday",
            &["day", "dd", "dobday", "dateday", "birthdateday"],
        ),
        (
            "dateofbirthmonth",
            &["month", "mm", "dobmonth", "birthmonth", "datemonth", "birthdatemonth"],
        ),
        (
            "dateofbirthyear",
            &["year", "yyyy", "dobyear", "birthyear", "dateyear", "birthdateyear"],
        ),
        // Personal info
        ("gender", &["sex"]),
        ("maritalstatus", &["marital", "status"]),
        ("nationality", &["nation", "countryofbirth"]),
        ("citizenship", &["citizen", "citizenstatus", "countryofcitizenship"]),
        // Education - high school
        (
            "educationhighschoolname",
            &["highschool", "school", "schoolname", "secondaryschool", "highschoolname"],
        ),
        (
            "educationhighschoollevel",
            &["educationlevel", "level", "qualification"],
        ),
        (
            "educationhighschoolstartyear",
            &["schoolstart", "schoolstartyear", "highschoolstart"],
        ),
        (
            "educationhighschoolendyear",
            &["schoolend", "schoolendyear", "highschoolend", "graduationyear", "graduation"],
        ),
        (
            "educationhighschoolgpa",
            &["schoolgpa", "highschoolgpa", "gpa", "grade", "grades"],
        ),
        // Education - college
        (
            "educationcollegename",
            &[
                "college", "university", "collegename", "universityname", "institution", "uni",
                "school",
            ],
        ),
        (
            "educationcollegedegree",
            &["degree", "degreetype", "qualification", "certification"],
        ),
        (
            "educationcollegemajor",
            &[
                "major", "fieldofstudy", "field", "concentration", "specialization", "subject",
                "course",
            ],
        ),
        (
            "educationcollegestartyear",
            &["collegestart", "universitystart", "degreestart"],
        ),
        (
            "educationcollegeendyear",
            &["collegeend", "universityend", "degreeend", "expectedgraduation", "graduation"],
        ),
        (
            "educationcollegegpa",
            &["collegegpa", "universitygpa", "gpa", "grade", "cgpa"],
        ),
        // Work experience
        (
            "workpositiontitle",
            &["jobtitle", "position", "title", "role", "job", "positiontitle", "designation"],
        ),
        (
            "workcompanyname",
            &[
                "company", "employer", "organization", "companyname", "employername", "workplace",
                "firm",
            ],
        ),
        ("worklocation", &["location", "joblocation", "workplace", "city"]),
        ("workemploymenttype", &["employmenttype", "jobtype", "type", "worktype"]),
        ("workstartmonth", &["startmonth", "frommonth", "beginmonth"]),
        ("workstartyear", &["startyear", "fromyear", "beginyear"]),
        ("workendmonth", &["endmonth", "tomonth", "untilmonth"]),
        ("workendyear", &["endyear", "toyear", "untilyear"]),
        (
            "workcurrentlyemployed",
            &["currentlyworking", "currentjob", "present", "currentlyemployed"],
        ),
        (
            "workdescription",
            &["description", "jobdescription", "responsibilities", "duties", "role", "experience"],
        ),
        // References
        (
            "referencename",
            &["reference", "refereename", "referee", "referral", "referenceperson"],
        ),
        ("referencerelationship", &["relationship", "relation"]),
        ("referencephone", &["referencecontact"]),
        ("referenceemail", &["refereemail"]),
        // Employment details
        ("employmentnoticeperiod", &["noticeperiod", "notice", "noticetime"]),
        (
            "employmentpreferredlocation",
            &["preferredlocation", "desiredlocation", "location", "preferredcity"],
        ),
        ("employmentcurrentlocation", &["currentlocation", "location", "city"]),
        (
            "employmentwillingtorelocate",
            &["relocate", "willingtorelocate", "relocation", "canrelocate"],
        ),
        (
            "employmentenglishproficiency",
            &["english", "englishproficiency", "englishlevel", "language"],
        ),
        (
            "employmentexpectedsalary",
            &[
                "salary", "expectedsalary", "salaryexpectation", "desiredsalary", "compensation",
                "pay", "wage",
            ],
        ),
        ("employmentavailabledays", &["availabledays", "workdays", "days"]),
        (
            "employmentavailablehours",
            &["availablehours", "workhours", "hours", "availability"],
        ),
        (
            "employmentauthorizedus",
            &["authorizedus", "usauthorization", "usworkauthorization", "uswork"],
        ),
        (
            "employmentauthorizeduk",
            &["authorizeduk", "ukauthorization", "ukworkauthorization"],
        ),
        ("employmentauthorizedcanada", &["authorizedcanada", "canadaauthorization"]),
        ("employmentvisastatus", &["visa", "visastatus", "workpermit", "authorization"]),
        // EEO
        ("eeodisability", &["disability", "disabilitystatus", "disabled"]),
        ("eeogenderidentity", &["genderidentity", "gender"]),
        ("eeosexualorientation", &["sexualorientation", "orientation"]),
        ("eeoveteranstatus", &["veteran", "veteranstatus", "military"]),
        ("eeominoritygroup", &["minority", "minoritygroup", "race", "ethnicity"]),
        ("eeoethnicity", &["ethnicity", "race", "racialbackground"]),
        // Documents and links
        ("resume", &["cv", "resumefile", "cvfile", "curriculum", "curriculumvitae"]),
        ("cv", &["resume", "cvfile", "resumefile"]),
        (
            "portfolio",
            &["website", "portfoliourl", "portfoliowebsite", "personalwebsite"],
        ),
        ("linkedin", &["linkedinurl", "linkedinprofile"]),
        ("github", &["githuburl", "githubprofile", "git"]),
    ];

    let map = entries
        .iter()
        .map(|(canonical, aliases)| {
            (
                canonical.to_string(),
                aliases.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect();
    AliasTable { map }
});

impl AliasTable {
    /// The shipped domain dictionary.
    pub fn builtin() -> &'static AliasTable {
        &BUILTIN
    }

    /// Build a table from normalized (canonical, aliases) pairs. Intended
    /// for tests and callers substituting a domain-specific dictionary.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(c, aliases)| (c.into(), aliases.into_iter().map(Into::into).collect()))
            .collect();
        Self { map }
    }

    /// Score two normalized strings against the table.
    ///
    /// Returns 1.0 for identity, 0.98 when one side is a canonical term and
    /// the other a listed alias, 0.95 when both are aliases of the same
    /// canonical term, and 0.0 otherwise.
    pub fn score(&self, normalized_label: &str, normalized_key: &str) -> f32 {
        if normalized_label.is_empty() || normalized_key.is_empty() {
            return 0.0;
        }
        if normalized_label == normalized_key {
            return 1.0;
        }

        for (canonical, aliases) in &self.map {
            let label_is_alias = aliases.iter().any(|a| a == normalized_label);
            let key_is_alias = aliases.iter().any(|a| a == normalized_key);

            if normalized_label == canonical && key_is_alias {
                return CANONICAL_ALIAS_SCORE;
            }
            if normalized_key == canonical && label_is_alias {
                return CANONICAL_ALIAS_SCORE;
            }
            if label_is_alias && key_is_alias {
                return SIBLING_ALIAS_SCORE;
            }
        }

        0.0
    }

    /// Number of canonical entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(AliasTable::builtin().score("email", "email"), 1.0);
    }

    #[test]
    fn test_canonical_to_alias() {
        let table = AliasTable::builtin();
        // "firstname" is canonical, "first" is a listed alias
        assert_eq!(table.score("firstname", "first"), CANONICAL_ALIAS_SCORE);
        // Symmetric: key side canonical
        assert_eq!(table.score("emailaddress", "email"), CANONICAL_ALIAS_SCORE);
    }

    #[test]
    fn test_sibling_aliases() {
        let table = AliasTable::builtin();
        // "phone" and "mobile" are both aliases of "phonenumber"
        assert_eq!(table.score("phone", "mobile"), SIBLING_ALIAS_SCORE);
    }

    #[test]
    fn test_no_match() {
        let table = AliasTable::builtin();
        assert_eq!(table.score("favoritecolor", "email"), 0.0);
        assert_eq!(table.score("", "email"), 0.0);
    }

    #[test]
    fn test_injected_table() {
        let table = AliasTable::from_entries(vec![("petname", vec!["pet", "animalname"])]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.score("petname", "pet"), CANONICAL_ALIAS_SCORE);
        assert_eq!(table.score("pet", "animalname"), SIBLING_ALIAS_SCORE);
        // Builtin vocabulary absent from the injected table
        assert_eq!(table.score("firstname", "first"), 0.0);
    }
}
