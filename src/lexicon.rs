//! Static term tables used by the heuristic scorer and keyword extractor.
//!
//! Weights are matched as lowercase substrings, so `"hospital"` also scores
//! inside `"hospitalised"`. That imprecision is accepted.

/// Health-specific positive indicators and their weights.
pub const POSITIVE_TERMS: &[(&str, u32)] = &[
    ("recovery", 3),
    ("recovered", 3),
    ("healing", 2),
    ("improvement", 2),
    ("breakthrough", 4),
    ("cure", 4),
    ("treatment", 2),
    ("vaccine", 3),
    ("vaccination", 3),
    ("immunity", 3),
    ("prevention", 2),
    ("decline", 3),
    ("decreasing", 3),
    ("better", 2),
    ("progress", 2),
    ("success", 3),
    ("effective", 2),
    ("safe", 2),
    ("approved", 3),
    ("hope", 2),
    ("optimistic", 2),
    ("good news", 4),
    ("promising", 3),
];

/// Health-specific negative indicators and their weights.
pub const NEGATIVE_TERMS: &[(&str, u32)] = &[
    ("outbreak", 4),
    ("pandemic", 4),
    ("epidemic", 4),
    ("death", 5),
    ("deaths", 5),
    ("died", 5),
    ("fatal", 5),
    ("severe", 3),
    ("critical", 4),
    ("emergency", 4),
    ("crisis", 4),
    ("surge", 3),
    ("spike", 3),
    ("increase", 2),
    ("rising", 2),
    ("spreading", 3),
    ("mutation", 3),
    ("variant", 3),
    ("concern", 2),
    ("warning", 3),
    ("alert", 3),
    ("danger", 4),
    ("risk", 2),
    ("threat", 3),
    ("fear", 2),
    ("hospital", 1),
    ("icu", 4),
    ("ventilator", 4),
];

/// Terms that raise concern on presence alone.
pub const CRITICAL_TERMS: &[&str] = &[
    "ebola",
    "hemorrhagic",
    "mortality",
    "fatality",
    "contagious",
    "infectious",
    "quarantine",
    "isolation",
    "lockdown",
    "shutdown",
];

/// Added to the critical score once per critical term present.
pub const CRITICAL_INCREMENT: u32 = 3;

/// Health terms kept by the keyword extractor even when they are stopwords.
pub const HEALTH_TERMS: &[&str] = &[
    "covid",
    "coronavirus",
    "pandemic",
    "epidemic",
    "vaccine",
    "vaccination",
    "virus",
    "bacteria",
    "infection",
    "disease",
    "outbreak",
    "symptoms",
    "treatment",
    "therapy",
    "medicine",
    "hospital",
    "clinic",
    "doctor",
    "patient",
    "health",
    "medical",
    "research",
    "study",
    "trial",
];

/// Keywords that raise the dashboard risk score when they rank in the top list.
pub const RISK_KEYWORDS: &[&str] = &[
    "outbreak",
    "death",
    "emergency",
    "crisis",
    "surge",
    "critical",
];

/// English stopwords.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below",
    "beside", "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could",
    "did", "do", "does", "doing", "done", "down", "due", "during", "each", "either", "else",
    "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "first", "for", "former", "formerly", "from", "further",
    "had", "has", "have", "having", "he", "hence", "her", "here", "hereafter", "hereby",
    "herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "i",
    "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself", "just", "last", "latter",
    "latterly", "least", "less", "made", "many", "may", "me", "meanwhile", "might", "mine",
    "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "namely", "neither",
    "never", "nevertheless", "next", "no", "nobody", "none", "noone", "nor", "not", "nothing",
    "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
    "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps",
    "please", "rather", "re", "said", "same", "says", "seem", "seemed", "seeming", "seems",
    "several", "she", "should", "since", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "this", "those", "though",
    "through", "throughout", "thru", "thus", "to", "together", "too", "toward", "towards",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
    "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who",
    "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without", "would",
    "yet", "you", "your", "yours", "yourself", "yourselves",
];
