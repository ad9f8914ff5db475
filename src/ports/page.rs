use color_eyre::eyre::Result;

/// Port trait over a page that has already been rendered by a browser.
///
/// Implementations live in `browser` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RenderedPage: Send + Sync {
    /// Every element matching `selector`, in document order.
    ///
    /// A selector that matches nothing is `Ok(vec![])`, not an error.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>>;
}

/// Port trait over a single element of a rendered page.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PageElement: Send + Sync {
    /// Descendants of this element matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>>;

    /// Rendered text content of the element.
    async fn text(&self) -> Result<String>;
}
