//! Local fallback corpus.
//!
//! A small fixed set of well-known Persian couplets used whenever the remote
//! API comes up short. Every call returns the full corpus in a fresh random
//! order.

use crate::model::{Category, Poem, Poet};
use rand::seq::SliceRandom;

/// Source of locally available poems.
///
/// Implementations must be cheap and infallible: the acquisition engine relies
/// on this to guarantee a feed is never empty.
pub trait PoemSource: Send + Sync {
    fn sample_poems(&self) -> Vec<Poem>;
}

/// Built-in sample corpus.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleCorpus;

impl PoemSource for SampleCorpus {
    fn sample_poems(&self) -> Vec<Poem> {
        let mut poems = corpus();
        poems.shuffle(&mut rand::thread_rng());
        poems
    }
}

struct Entry {
    id: i64,
    title: &'static str,
    slug: &'static str,
    lines: [&'static str; 2],
    poet: (i64, &'static str, &'static str, Option<i32>, Option<i32>),
    category: (i64, &'static str, &'static str),
}

const HAFEZ: (i64, &str, &str, Option<i32>, Option<i32>) =
    (2, "حافظ", "شاعر بزرگ ایرانی", Some(1315), Some(1390));
const KHAYYAM: (i64, &str, &str, Option<i32>, Option<i32>) =
    (3, "خیام", "شاعر و فیلسوف ایرانی", Some(1048), Some(1131));
const FERDOWSI: (i64, &str, &str, Option<i32>, Option<i32>) =
    (4, "فردوسی", "شاعر حماسه‌سرای ایرانی", Some(940), Some(1020));
const RUMI: (i64, &str, &str, Option<i32>, Option<i32>) =
    (5, "مولوی", "شاعر و عارف بزرگ", Some(1207), Some(1273));
const SAADI: (i64, &str, &str, Option<i32>, Option<i32>) =
    (7, "سعدی", "شاعر و نویسنده بزرگ ایرانی", Some(1210), Some(1291));
const BABA_TAHER: (i64, &str, &str, Option<i32>, Option<i32>) =
    (28, "باباطاهر", "شاعر دوبیتی‌سرای ایرانی", None, Some(1019));

const GHAZAL: (i64, &str, &str) = (1, "غزل", "ghazal");
const ROBAI: (i64, &str, &str) = (2, "رباعی", "robai");
const MASNAVI: (i64, &str, &str) = (3, "مثنوی", "masnavi");
const DOBEYTI: (i64, &str, &str) = (4, "دوبیتی", "dobeyti");

const ENTRIES: [Entry; 10] = [
    Entry {
        id: 1,
        title: "الا یا ایها الساقی",
        slug: "ghazal-1",
        lines: [
            "الا یا ایها الساقی ادر کاسا و ناولها",
            "که عشق آسان نمود اول ولی افتاد مشکل‌ها",
        ],
        poet: HAFEZ,
        category: GHAZAL,
    },
    Entry {
        id: 2,
        title: "این قافله عمر",
        slug: "robai-1",
        lines: [
            "این قافله عمر عجب می‌گذرد",
            "دریاب دمی که با طرب می‌گذرد",
        ],
        poet: KHAYYAM,
        category: ROBAI,
    },
    Entry {
        id: 3,
        title: "بشنو این نی",
        slug: "masnavi-1",
        lines: [
            "بشنو این نی چون شکایت می‌کند",
            "از جدایی‌ها حکایت می‌کند",
        ],
        poet: RUMI,
        category: MASNAVI,
    },
    Entry {
        id: 4,
        title: "بنی آدم",
        slug: "ghazal-2",
        lines: [
            "بنی آدم اعضای یکدیگرند",
            "که در آفرینش ز یک گوهرند",
        ],
        poet: SAADI,
        category: GHAZAL,
    },
    Entry {
        id: 5,
        title: "توانا بود هر که دانا بود",
        slug: "masnavi-2",
        lines: [
            "توانا بود هر که دانا بود",
            "ز دانش دل پیر برنا بود",
        ],
        poet: FERDOWSI,
        category: MASNAVI,
    },
    Entry {
        id: 6,
        title: "یوسف گم گشته",
        slug: "ghazal-3",
        lines: [
            "یوسف گم گشته بازآید به کنعان غم مخور",
            "کلبه احزان شود روزی گلستان غم مخور",
        ],
        poet: HAFEZ,
        category: GHAZAL,
    },
    Entry {
        id: 7,
        title: "ای دوست بیا",
        slug: "robai-2",
        lines: [
            "ای دوست بیا تا غم فردا نخوریم",
            "وین یک دم عمر را غنیمت شمریم",
        ],
        poet: KHAYYAM,
        category: ROBAI,
    },
    Entry {
        id: 8,
        title: "من مست و تو دیوانه",
        slug: "ghazal-4",
        lines: [
            "من مست و تو دیوانه ما را که برد خانه",
            "صد بار تو را گفتم کم خور دو سه پیمانه",
        ],
        poet: RUMI,
        category: GHAZAL,
    },
    Entry {
        id: 9,
        title: "منت حاتم طایی",
        slug: "masnavi-3",
        lines: [
            "هر که نان از عمل خویش خورد",
            "منت حاتم طایی نبرد",
        ],
        poet: SAADI,
        category: MASNAVI,
    },
    Entry {
        id: 10,
        title: "خوشا آنان",
        slug: "dobeyti-1",
        lines: [
            "خوشا آنان که الله یارشان بی",
            "که حمد و قل هو الله کارشان بی",
        ],
        poet: BABA_TAHER,
        category: DOBEYTI,
    },
];

fn corpus() -> Vec<Poem> {
    ENTRIES
        .iter()
        .map(|e| {
            let (poet_id, name, description, birth_year, death_year) = e.poet;
            let (category_id, category_title, category_slug) = e.category;
            Poem {
                id: e.id,
                title: e.title.to_string(),
                url_slug: e.slug.to_string(),
                plain_text: format!("{}\n{}\n", e.lines[0], e.lines[1]),
                html_text: format!("<p>{}<br>{}</p>", e.lines[0], e.lines[1]),
                poet: Poet {
                    id: poet_id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    birth_year,
                    death_year,
                },
                category: Category {
                    id: category_id,
                    title: category_title.to_string(),
                    url_slug: category_slug.to_string(),
                    parent_id: None,
                },
            }
        })
        .collect()
}
