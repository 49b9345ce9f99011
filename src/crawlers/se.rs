//! School of software engineering (se.xjtu.edu.cn) notices.

use crate::crawlers::listing::{Column, ListingLayout, Site};
use crate::models::Source;

const NEXT: &str = "body > main > div > div:nth-of-type(2) > div:nth-of-type(2) > div > div > span:nth-of-type(2) > span:nth-last-of-type(2) > a";

pub static SITE: Site = Site {
    source: Source::Se,
    origin: "https://se.xjtu.edu.cn/",
    landing: "xwgg/tzgg.htm",
    columns: &[Column {
        path: "xwgg/tzgg.htm",
        tag: None,
    }],
    layout: ListingLayout {
        row: "body > main > div > div:nth-of-type(2) > div:nth-of-type(2) > ul > li",
        title: "a > p:nth-of-type(2)",
        title_own_text: false,
        link: "a",
        date: Some("a > p:nth-of-type(1) > span"),
        tag: None,
        next_first: NEXT,
        next_rest: NEXT,
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::listing::parse_listing;
    use chrono::NaiveDate;

    const PAGE: &str = r#"
        <html><body><main><div>
          <div class="banner"></div>
          <div class="body">
            <div class="side"></div>
            <div class="list">
              <ul>
                <li><a href="../info/1052/3001.htm"><p><span>2025-03-01</span></p><p>软件学院 2025 届毕业设计安排</p></a></li>
                <li><a href="../info/1052/3002.htm"><p><span>2025-02-27</span></p><p>关于开展学生座谈会的通知</p></a></li>
              </ul>
              <div><div>
                <span>共 40 条</span>
                <span class="p_pages">
                  <span class="p_first_d">首页</span>
                  <span class="p_prev_d">上页</span>
                  <span class="p_no_d">1</span>
                  <span class="p_next"><a href="tzgg/3.htm">下页</a></span>
                  <span class="p_last"><a href="tzgg/1.htm">尾页</a></span>
                </span>
              </div></div>
            </div>
          </div>
        </div></main></body></html>
    "#;

    #[test]
    fn test_parse_se_listing() {
        let page = parse_listing(PAGE, &SITE.layout, true).unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].title, "软件学院 2025 届毕业设计安排");
        assert_eq!(page.rows[0].href, "../info/1052/3001.htm");
        assert_eq!(page.rows[0].date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(page.rows[1].tag, None);
        assert_eq!(page.next.as_deref(), Some("tzgg/3.htm"));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let last = PAGE.replace(
            r#"<span class="p_next"><a href="tzgg/3.htm">下页</a></span>"#,
            r#"<span class="p_next_d">下页</span>"#,
        );
        let page = parse_listing(&last, &SITE.layout, false).unwrap();
        assert!(page.next.is_none());
    }
}
