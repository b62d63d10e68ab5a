//! Aggregate statistics over a list of posts.

use crate::models::BlogRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteBlog {
    pub title: String,
    pub author: Option<String>,
    pub likes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorBlogs {
    pub author: Option<String>,
    pub blogs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLikes {
    pub author: Option<String>,
    pub likes: i64,
}

pub fn total_likes(blogs: &[BlogRecord]) -> i64 {
    blogs.iter().map(|blog| blog.likes).sum()
}

/// The first post holding the strictly greatest like count.
pub fn favorite_blog(blogs: &[BlogRecord]) -> Option<FavoriteBlog> {
    let (first, rest) = blogs.split_first()?;
    let favorite = rest
        .iter()
        .fold(first, |fav, blog| if blog.likes > fav.likes { blog } else { fav });
    Some(FavoriteBlog {
        title: favorite.title.clone(),
        author: favorite.author.clone(),
        likes: favorite.likes,
    })
}

/// Accumulates a per-author value keeping authors in first-seen order.
fn tally<F>(blogs: &[BlogRecord], value: F) -> Vec<(Option<String>, i64)>
where
    F: Fn(&BlogRecord) -> i64,
{
    let mut totals: Vec<(Option<String>, i64)> = Vec::new();
    for blog in blogs {
        match totals.iter_mut().find(|(author, _)| *author == blog.author) {
            Some((_, total)) => *total += value(blog),
            None => totals.push((blog.author.clone(), value(blog))),
        }
    }
    totals
}

/// Ties go to the author seen first.
fn leader(totals: Vec<(Option<String>, i64)>) -> Option<(Option<String>, i64)> {
    totals
        .into_iter()
        .fold(None, |best, (author, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((author, total)),
        })
}

pub fn most_blogs(blogs: &[BlogRecord]) -> Option<AuthorBlogs> {
    leader(tally(blogs, |_| 1)).map(|(author, count)| AuthorBlogs {
        author,
        blogs: count as usize,
    })
}

pub fn most_likes(blogs: &[BlogRecord]) -> Option<AuthorLikes> {
    leader(tally(blogs, |blog| blog.likes)).map(|(author, likes)| AuthorLikes { author, likes })
}
