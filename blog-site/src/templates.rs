use blog_core::{ListingView, Locale, PostView};
use maud::{html, Markup, PreEscaped, DOCTYPE};

const STYLE: &str = "body{font-family:Inter,sans-serif;background:#1a1d23;color:#d7d7d7;margin:0}\
main{max-width:720px;margin:0 auto;padding:2rem 1rem}\
a{color:inherit;text-decoration:none}\
.post-item{margin-bottom:3rem}.post-item h2{color:#fff;margin:0 0 .5rem}\
.info{display:flex;gap:1.5rem;font-size:.875rem;color:#bbb}\
.banner img{width:100%;max-height:400px;object-fit:cover}\
button.load-more{background:none;border:0;color:#ff57b2;font-size:1.125rem;cursor:pointer}";

// Appends the next listing page client-side. One request in flight at a time.
const LOAD_MORE_JS: &str = r#"(function(){
  var button = document.querySelector('button.load-more');
  if (!button) return;
  var list = document.querySelector('.posts');
  var busy = false;
  var months = (button.dataset.months || '').split(',');
  function formatDate(raw){
    // content store offsets come as +hhmm
    var ts = raw ? new Date(String(raw).replace(/([+-]\d{2})(\d{2})$/, '$1:$2')) : null;
    if (!ts || isNaN(ts.getTime()) || months.length !== 12) return button.dataset.unknownDate;
    var day = String(ts.getUTCDate()).padStart(2, '0');
    return day + ' ' + months[ts.getUTCMonth()] + ' ' + ts.getUTCFullYear();
  }
  button.addEventListener('click', function(){
    if (busy || !button.dataset.nextPage) return;
    busy = true;
    fetch(button.dataset.nextPage).then(function(res){
      if (!res.ok) throw new Error('status ' + res.status);
      return res.json();
    }).then(function(page){
      (page.results || []).forEach(function(post){
        var a = document.createElement('a');
        a.href = '/post/' + encodeURIComponent(post.uid);
        a.className = 'post-item';
        var h = document.createElement('h2');
        h.textContent = post.data.title;
        var p = document.createElement('p');
        p.textContent = post.data.subtitle;
        var s = document.createElement('div');
        s.className = 'info';
        var t = document.createElement('time');
        t.textContent = formatDate(post.first_publication_date);
        var au = document.createElement('span');
        au.textContent = post.data.author;
        s.appendChild(t); s.appendChild(au);
        a.appendChild(h); a.appendChild(p); a.appendChild(s);
        list.appendChild(a);
      });
      if (page.next_page) { button.dataset.nextPage = page.next_page; }
      else { button.remove(); }
    }).catch(function(err){ console.warn('load more failed', err); })
      .finally(function(){ busy = false; });
  });
})();"#;

struct Labels {
    load_more: &'static str,
    loading: &'static str,
    not_found: &'static str,
    back: &'static str,
}

fn labels(locale: Locale) -> Labels {
    match locale {
        Locale::PtBr => Labels {
            load_more: "Carregar mais posts",
            loading: "Carregando...",
            not_found: "Post não encontrado",
            back: "Voltar para o início",
        },
        Locale::EnUs => Labels {
            load_more: "Load more posts",
            loading: "Loading...",
            not_found: "Post not found",
            back: "Back to home",
        },
    }
}

fn layout(site_title: &str, title: &str, locale: Locale, head_extra: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(locale.html_lang()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(STYLE)) }
                (head_extra)
            }
            body {
                header {
                    a href="/" { img src="/Logo.svg" alt=(site_title); }
                }
                (content)
            }
        }
    }
}

pub fn listing_page(site_title: &str, view: &ListingView, locale: Locale) -> Markup {
    let labels = labels(locale);
    let content = html! {
        main {
            div.posts {
                @for item in &view.items {
                    a.post-item href={ "/post/" (item.uid) } {
                        h2 { (item.title) }
                        p { (item.subtitle) }
                        div.info {
                            time { (item.published) }
                            span { (item.author) }
                        }
                    }
                }
            }
            @if let Some(next) = &view.load_more {
                button.load-more type="button" data-next-page=(next)
                    data-months=(locale.abbreviated_months().join(","))
                    data-unknown-date=(locale.unknown_date()) { (labels.load_more) }
                script { (PreEscaped(LOAD_MORE_JS)) }
            }
        }
    };
    layout(site_title, site_title, locale, html! {}, content)
}

pub fn post_page(site_title: &str, view: &PostView, locale: Locale) -> Markup {
    let title = format!("{} | {}", view.title, site_title);
    let content = html! {
        @if !view.banner.url.is_empty() {
            div.banner { img src=(view.banner.url) alt=(view.banner.alt); }
        }
        main {
            article {
                h1 { (view.title) }
                div.info {
                    time { (view.published) }
                    span { (view.author) }
                    span { (view.read_time_minutes) " min" }
                }
                @for section in &view.sections {
                    section {
                        h2 { (section.heading) }
                        div { (PreEscaped(&section.html)) }
                    }
                }
            }
        }
    };
    layout(site_title, &title, locale, html! {}, content)
}

/// Shown while a page that was not built ahead of time is generated.
pub fn placeholder_page(site_title: &str, locale: Locale) -> Markup {
    let labels = labels(locale);
    let head = html! { meta http-equiv="refresh" content="2"; };
    let content = html! {
        main { p.loading { (labels.loading) } }
    };
    layout(site_title, labels.loading, locale, head, content)
}

pub fn not_found_page(site_title: &str, locale: Locale) -> Markup {
    let labels = labels(locale);
    let content = html! {
        main {
            h1 { (labels.not_found) }
            a href="/" { (labels.back) }
        }
    };
    layout(site_title, labels.not_found, locale, html! {}, content)
}
