//! Dean's office (dean.xjtu.edu.cn) teaching notices.
//!
//! Each row carries its category as a bracketed `<i>` label inside the title
//! anchor, e.g. `<a><i>[教学运行]</i>关于...</a>`.

use crate::crawlers::listing::{Column, ListingLayout, Site};
use crate::models::Source;

const NEXT: &str = "#ny-main > div:nth-of-type(3) > div > span > span:nth-last-of-type(2) > a";

pub static SITE: Site = Site {
    source: Source::Jwc,
    origin: "https://dean.xjtu.edu.cn/",
    landing: "jxxx/jxtz2.htm",
    columns: &[Column {
        path: "jxxx/jxtz2.htm",
        tag: None,
    }],
    layout: ListingLayout {
        row: "#ny-main > div:nth-of-type(3) > ul > li",
        title: "a",
        title_own_text: true,
        link: "a",
        date: Some("span"),
        tag: Some("a > i"),
        next_first: NEXT,
        next_rest: NEXT,
    },
};
