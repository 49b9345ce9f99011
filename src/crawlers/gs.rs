//! Graduate school (gs.xjtu.edu.cn) notices.
//!
//! The notice board is split into six columns; items are tagged with the
//! column they were listed under. The pager shows only "next"/"last" on the
//! first page, so "next" is the first anchor there and the third anchor
//! (after "first"/"prev") everywhere else.

use crate::crawlers::listing::{Column, ListingLayout, Site};
use crate::models::Source;

pub static SITE: Site = Site {
    source: Source::Gs,
    origin: "https://gs.xjtu.edu.cn/",
    landing: "tzgg.htm",
    columns: &[
        Column {
            path: "tzgg/zsgz.htm",
            tag: Some("招生工作"),
        },
        Column {
            path: "tzgg/pygz.htm",
            tag: Some("培养工作"),
        },
        Column {
            path: "tzgg/gjjl.htm",
            tag: Some("国际交流"),
        },
        Column {
            path: "tzgg/xwgz.htm",
            tag: Some("学位工作"),
        },
        Column {
            path: "tzgg/yggz.htm",
            tag: Some("研工工作"),
        },
        Column {
            path: "tzgg/zhgz.htm",
            tag: Some("综合工作"),
        },
    ],
    layout: ListingLayout {
        row: "#wrapper > div:nth-of-type(4) > div > div:nth-of-type(2) > div:nth-of-type(2) > ul > li",
        title: "a",
        title_own_text: false,
        link: "a",
        date: Some("span"),
        tag: None,
        next_first: "#wrapper > div:nth-of-type(4) > div > div:nth-of-type(2) > div:nth-of-type(2) > div > table > tbody > tr:nth-of-type(1) > td:nth-of-type(1) > table > tbody > tr:nth-of-type(1) > td:nth-of-type(2) > div > a:nth-of-type(1)",
        next_rest: "#wrapper > div:nth-of-type(4) > div > div:nth-of-type(2) > div:nth-of-type(2) > div > table > tbody > tr:nth-of-type(1) > td:nth-of-type(1) > table > tbody > tr:nth-of-type(1) > td:nth-of-type(2) > div > a:nth-of-type(3)",
    },
};
