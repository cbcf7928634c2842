//! Main product image chain

use super::chain::{Chain, Strategy};
use super::page::{has_class_matching, ProductPage};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static MAIN_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.product-main-image").unwrap());
static PRODUCT_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.product-image, img#product-image").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static IMAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)product.*img|main.*image").unwrap());

/// Image attributes, highest quality first
const SOURCE_ATTRS: [&str; 4] = ["data-large", "data-lazy-src", "data-src", "src"];

pub static IMAGE_CHAIN: Chain<String> = Chain::new(
    "image_url",
    &[
        Strategy::new("product-main-image", main_image),
        Strategy::new("product-image", product_image),
        Strategy::new("image-class", classed_image),
        Strategy::new("og:image", og_image),
    ],
);

fn image_source(page: &ProductPage, img: ElementRef<'_>) -> Option<String> {
    SOURCE_ATTRS
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .find_map(|src| page.resolve(src))
}

fn main_image(page: &ProductPage) -> Option<String> {
    page.select_first(&MAIN_IMAGE)
        .and_then(|img| image_source(page, img))
}

fn product_image(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&PRODUCT_IMAGE)
        .find_map(|img| image_source(page, img))
}

fn classed_image(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&IMG)
        .filter(|img| has_class_matching(*img, &IMAGE_CLASS))
        .find_map(|img| image_source(page, img))
}

fn og_image(page: &ProductPage) -> Option<String> {
    page.meta_property("og:image")
        .and_then(|src| page.resolve(&src))
}
